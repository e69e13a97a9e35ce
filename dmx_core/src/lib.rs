//! # DMX Core
//!
//! This crate contains the core mechanisms shared by the
//! OSC-DMX bridge: the lock-free packet ring that hands raw
//! datagrams from the network thread to the emitter thread,
//! and helpers for realtime thread scheduling.

pub mod ring;
pub mod rt;

pub use ring::{PacketRing, RingConsumer, RingProducer};
