//! Ingress loop: datagrams from the packet source into the ring.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use log::warn;

use dmx_core::ring::RingProducer;
use dmx_osc::PacketSource;

/// Largest datagram accepted from the transport.
const MAX_DATAGRAM: usize = 2048;

/// Bounded wait per poll, so the stop flag is observed promptly.
const POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Copies datagrams into the ring until the stop flag is raised.
///
/// A transport error or a full ring costs the datagram in question,
/// nothing more; the loop keeps polling.
pub fn run(source: &mut dyn PacketSource, mut ring: RingProducer, stop: &AtomicBool) {
    let mut buf = [0u8; MAX_DATAGRAM];

    while !stop.load(Ordering::Acquire) {
        match source.recv_timeout(&mut buf, POLL_TIMEOUT) {
            Ok(Some(len)) => match ring.write_request(len) {
                Some(grant) => {
                    grant[..len].copy_from_slice(&buf[..len]);
                    ring.write_commit(len);
                }
                None => warn!("packet ring full, dropping {len} byte datagram"),
            },
            Ok(None) => {}
            Err(err) => warn!("OSC receive failed: {err}"),
        }
    }
}
