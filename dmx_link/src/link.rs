//! The DMX output abstraction and its in-memory implementation.

use dmx_universe::FRAME_LEN;

use crate::error::Result;

/// A sink for complete DMX512 frames.
///
/// `send_frame` owns the line-level framing: implementations must
/// assert BREAK, release to MAB, then write the 513-byte payload.
pub trait DmxLink: Send {
    /// Transmits one frame (start code + 512 channel bytes).
    ///
    /// An error is fatal for this link; the emitter stops and the
    /// supervisor decides whether to reinitialise.
    fn send_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<()>;

    /// Releases the underlying device. Best effort; the link must
    /// not be used afterwards.
    fn close(&mut self) -> Result<()>;
}

/// A link that records frames instead of transmitting them.
///
/// Stands in for the adapter wherever no hardware is present:
/// end-to-end tests drive the emitter against it and inspect the
/// frames that would have gone out on the wire.
#[derive(Debug, Default)]
pub struct MemoryLink {
    frames: Vec<[u8; FRAME_LEN]>,
    fail_next: bool,
    closed: bool,
}

impl MemoryLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All frames sent so far, oldest first.
    pub fn frames(&self) -> &[[u8; FRAME_LEN]] {
        &self.frames
    }

    /// The most recently sent frame.
    pub fn last_frame(&self) -> Option<&[u8; FRAME_LEN]> {
        self.frames.last()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Makes the next `send_frame` fail, simulating device loss.
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }
}

impl DmxLink for MemoryLink {
    fn send_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<()> {
        if self.closed {
            return Err(crate::error::LinkError::Closed);
        }
        if self.fail_next {
            self.fail_next = false;
            return Err(crate::error::LinkError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "simulated device loss",
            )));
        }

        self.frames.push(*frame);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
