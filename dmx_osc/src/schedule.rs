//! Time-tag scheduler for deferred OSC messages.

use std::{collections::VecDeque, time::SystemTime};

use rosc::OscMessage;

/// A deferred OSC message and the wall-clock instant it falls due.
///
/// Messages are stored in decoded form; the datagram was already
/// parsed on the emitter thread when the enclosing bundle arrived.
#[derive(Debug, Clone)]
pub struct ScheduledPacket {
    pub due: SystemTime,
    pub msg: OscMessage,
}

/// An ordered queue of [`ScheduledPacket`]s, ascending by `due`.
///
/// Insertion is stable: of two packets with the same `due`, the one
/// enqueued first drains first. Owned and driven solely by the
/// emitter thread; capacity is bounded only by memory.
#[derive(Debug, Default)]
pub struct TimetagScheduler {
    queue: VecDeque<ScheduledPacket>,
}

impl TimetagScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a message due at `due`, preserving ascending order.
    pub fn enqueue(&mut self, due: SystemTime, msg: OscMessage) {
        let at = self
            .queue
            .iter()
            .position(|packet| packet.due > due)
            .unwrap_or(self.queue.len());
        self.queue.insert(at, ScheduledPacket { due, msg });
    }

    /// Removes and yields every packet with `due <= now`, in
    /// ascending `due` order.
    pub fn drain_due(&mut self, now: SystemTime) -> impl Iterator<Item = ScheduledPacket> + '_ {
        let ready = self
            .queue
            .iter()
            .take_while(|packet| packet.due <= now)
            .count();
        self.queue.drain(..ready)
    }

    /// Drops all pending packets.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
