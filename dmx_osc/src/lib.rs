//! # DMX OSC
//!
//! OSC ingestion for the DMX bridge. Decoded packets flow through
//! the address dispatcher into the universe; bundled messages with a
//! future time-tag wait in the scheduler until they fall due.
//!
//! Addresses follow the `/dmx/<channel>/<priority>` contract with
//! `*`/`?` wildcards in either numeric component. A message whose
//! first argument is an `int32` sets the addressed candidate value;
//! any other message withdraws it.

pub mod dispatch;
pub mod error;
pub mod pattern;
pub mod schedule;
pub mod source;
pub mod timetag;

pub use dispatch::{apply_message, dispatch_packet};
pub use error::SourceError;
pub use schedule::{ScheduledPacket, TimetagScheduler};
pub use source::{PacketSource, UdpPacketSource};
pub use timetag::Timetag;
