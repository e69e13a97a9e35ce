//! The full 512-channel universe and its frame snapshot.

use crate::{slot::Slot, CHANNEL_COUNT, FRAME_LEN, START_CODE};

/// State of one DMX512 universe: 512 priority-merged slots.
///
/// Not concurrency-safe; all mutation and snapshotting happens on
/// the emitter thread.
pub struct Universe {
    slots: [Slot; CHANNEL_COUNT],
}

impl Universe {
    /// Creates a dark universe: every slot empty, every output 0.
    pub fn new() -> Self {
        Self {
            slots: [Slot::new(); CHANNEL_COUNT],
        }
    }

    /// Borrows the slot for `channel` (0-based, below
    /// [`CHANNEL_COUNT`]; the dispatcher guarantees range).
    #[inline]
    pub fn slot(&self, channel: u16) -> &Slot {
        &self.slots[channel as usize]
    }

    #[inline]
    pub fn slot_mut(&mut self, channel: u16) -> &mut Slot {
        &mut self.slots[channel as usize]
    }

    /// Resolves the universe into a transmittable DMX frame: start
    /// code followed by the 512 channel bytes.
    pub fn snapshot(&self, frame: &mut [u8; FRAME_LEN]) {
        frame[0] = START_CODE;
        for (out, slot) in frame[1..].iter_mut().zip(self.slots.iter()) {
            *out = slot.value();
        }
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_universe_snapshots_blackout() {
        let universe = Universe::new();
        let mut frame = [0xffu8; FRAME_LEN];

        universe.snapshot(&mut frame);

        assert_eq!(frame[0], START_CODE);
        assert!(frame[1..].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn test_snapshot_maps_channel_to_offset_by_one() {
        let mut universe = Universe::new();
        universe.slot_mut(0).set(0, 0xff);
        universe.slot_mut(511).set(3, 0x7f);

        let mut frame = [0u8; FRAME_LEN];
        universe.snapshot(&mut frame);

        assert_eq!(frame[0], START_CODE);
        assert_eq!(frame[1], 0xff);
        assert_eq!(frame[512], 0x7f);
        assert!(frame[2..512].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn test_snapshot_reflects_priority_merge() {
        let mut universe = Universe::new();
        universe.slot_mut(5).set(0, 100);
        universe.slot_mut(5).set(3, 200);

        let mut frame = [0u8; FRAME_LEN];
        universe.snapshot(&mut frame);
        assert_eq!(frame[6], 200);

        universe.slot_mut(5).clear(3);
        universe.snapshot(&mut frame);
        assert_eq!(frame[6], 100);
    }
}
