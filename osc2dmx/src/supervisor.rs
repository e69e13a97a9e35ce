//! Core lifecycle: bring the bridge up, run it, tear it down.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::Context;
use log::{error, info};

use dmx_core::{ring::PacketRing, rt};
use dmx_link::SerialDmxLink;
use dmx_osc::UdpPacketSource;

use crate::{cli::Args, emitter::Emitter, ingress};

/// Capacity of the datagram hand-off ring.
const RING_CAPACITY: usize = 8192;

/// Delay between reconnect attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Owns bridge startup, shutdown and the optional reconnect loop.
///
/// `stop` ends the running incarnation; `reconnect` decides whether
/// a new one follows. The signal handler clears `reconnect` before
/// raising `stop`, so an operator interrupt always terminates.
pub struct Supervisor {
    args: Args,
    stop: Arc<AtomicBool>,
    reconnect: Arc<AtomicBool>,
}

impl Supervisor {
    pub fn new(args: Args, stop: Arc<AtomicBool>, reconnect: Arc<AtomicBool>) -> Self {
        Self {
            args,
            stop,
            reconnect,
        }
    }

    /// Runs the bridge until shutdown.
    ///
    /// A startup failure of the first incarnation aborts the
    /// process; once the bridge has been up, failures only delay
    /// the next reconnect attempt.
    pub fn run(&self) -> anyhow::Result<()> {
        self.run_once()?;

        while self.reconnect.load(Ordering::Acquire) {
            info!(
                "reinitialising DMX link in {}s",
                RECONNECT_DELAY.as_secs()
            );
            thread::sleep(RECONNECT_DELAY);
            if !self.reconnect.load(Ordering::Acquire) {
                break;
            }

            if let Err(err) = self.run_once() {
                error!("reinitialisation failed: {err:#}");
            }
        }

        info!("bridge terminated");
        Ok(())
    }

    /// One incarnation: fresh ring, universe and scheduler, the
    /// emitter on its own thread, ingress on the calling thread.
    ///
    /// Starting fresh after a reconnect deliberately blacks out the
    /// universe, so stale intents never flash through.
    fn run_once(&self) -> anyhow::Result<()> {
        let (producer, consumer) = PacketRing::with_capacity(RING_CAPACITY);

        let mut source = UdpPacketSource::bind(&self.args.uri)
            .with_context(|| format!("cannot listen on '{}'", self.args.uri))?;

        let link = SerialDmxLink::open(
            self.args.vid,
            self.args.pid,
            self.args.description.as_deref(),
            self.args.serial.as_deref(),
        )
        .context("cannot open DMX adapter")?;

        self.stop.store(false, Ordering::Release);

        let emitter = Emitter::new(consumer, link, self.args.fps, Arc::clone(&self.stop));
        let emitter_priority = self.args.output_priority;
        let emitter_thread = thread::Builder::new()
            .name("dmx-emitter".into())
            .spawn(move || {
                rt::promote_current_thread(emitter_priority);
                emitter.run();
            })
            .context("cannot spawn emitter thread")?;

        info!("bridge running at {} fps", self.args.fps);

        rt::promote_current_thread(self.args.input_priority);
        ingress::run(&mut source, producer, &self.stop);

        emitter_thread
            .join()
            .map_err(|_| anyhow::anyhow!("emitter thread panicked"))?;

        Ok(())
    }
}
