//! # DMX Link
//!
//! Output side of the bridge: transmit resolved DMX frames to the
//! fixtures. The [`DmxLink`] trait abstracts the wire so the emitter
//! can be driven against hardware ([`SerialDmxLink`]) or memory
//! ([`MemoryLink`]).

pub mod error;
pub mod link;
pub mod serial;

pub use error::LinkError;
pub use link::{DmxLink, MemoryLink};
pub use serial::SerialDmxLink;
