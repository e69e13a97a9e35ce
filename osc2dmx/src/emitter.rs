//! The paced emitter: ring to universe to DMX frame.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant, SystemTime},
};

use log::{debug, error, warn};

use dmx_core::ring::RingConsumer;
use dmx_link::{DmxLink, LinkError};
use dmx_osc::{apply_message, dispatch_packet, Timetag, TimetagScheduler};
use dmx_universe::{Universe, FRAME_LEN};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Owns everything the output side touches: the ring consumer, the
/// scheduler, the universe and the link. All of it stays on the
/// emitter thread, so none of it needs locking.
pub struct Emitter<L: DmxLink> {
    ring: RingConsumer,
    scheduler: TimetagScheduler,
    universe: Universe,
    link: L,
    period: Duration,
    stop: Arc<AtomicBool>,
    frame: [u8; FRAME_LEN],
}

impl<L: DmxLink> Emitter<L> {
    pub fn new(ring: RingConsumer, link: L, fps: u32, stop: Arc<AtomicBool>) -> Self {
        Self {
            ring,
            scheduler: TimetagScheduler::new(),
            universe: Universe::new(),
            link,
            period: Duration::from_nanos(NANOS_PER_SEC / u64::from(fps.max(1))),
            stop,
            frame: [0; FRAME_LEN],
        }
    }

    /// One tick: drain the ring, advance the scheduler, snapshot the
    /// universe, transmit the frame.
    ///
    /// Within a tick the ring drains before the scheduler, so a
    /// freshly arrived update beats a scheduled one only if it was
    /// committed later. `now` is wall-clock time; time-tags are
    /// absolute wall-clock instants.
    fn tick(&mut self, now: SystemTime) -> Result<(), LinkError> {
        while let Some(datagram) = self.ring.read_request() {
            let decoded = rosc::decoder::decode_udp(datagram).map(|(_, packet)| packet);
            self.ring.read_advance();

            match decoded {
                Ok(packet) => dispatch_packet(
                    &mut self.universe,
                    &mut self.scheduler,
                    packet,
                    Timetag::Immediate,
                ),
                Err(err) => debug!("discarding malformed OSC datagram: {err:?}"),
            }
        }

        for packet in self.scheduler.drain_due(now) {
            apply_message(&mut self.universe, &packet.msg);
        }

        self.universe.snapshot(&mut self.frame);
        self.link.send_frame(&self.frame)
    }

    /// Paced loop against absolute deadlines on the monotonic clock.
    ///
    /// The deadline advances by exactly one period per iteration; a
    /// late tick is not coalesced, the loop catches up one frame at
    /// a time.
    pub fn run(mut self) {
        let mut deadline = Instant::now() + self.period;

        while !self.stop.load(Ordering::Acquire) {
            if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
                thread::sleep(wait);
            }
            if self.stop.load(Ordering::Acquire) {
                break;
            }

            if let Err(err) = self.tick(SystemTime::now()) {
                error!("DMX transmit failed: {err}");
                self.stop.store(true, Ordering::Release);
                break;
            }

            deadline += self.period;
        }

        if let Err(err) = self.link.close() {
            warn!("closing DMX link failed: {err}");
        }
    }
}
