//! # DMX Universe
//!
//! Priority-merged state for one DMX512 universe. Each of the 512
//! channels holds up to 32 prioritised candidate values; the highest
//! set priority wins when the universe is snapshotted into a frame.

pub mod slot;
pub mod universe;

pub use slot::Slot;
pub use universe::Universe;

/// Channels in one DMX512 universe.
pub const CHANNEL_COUNT: usize = 512;

/// Candidate priorities per channel.
pub const PRIORITY_COUNT: usize = 32;

/// Transmitted frame length: start code plus one byte per channel.
pub const FRAME_LEN: usize = CHANNEL_COUNT + 1;

/// Start code for ordinary dimmer data.
pub const START_CODE: u8 = 0x00;
