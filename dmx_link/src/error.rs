//! Error types for DMX output links.

use std::{fmt, io};

/// Errors raised while opening or driving a DMX link.
#[derive(Debug)]
pub enum LinkError {
    /// No attached USB serial device matches the requested identity.
    DeviceNotFound { vid: u16, pid: u16 },
    /// The serial layer rejected an operation.
    Serial(serialport::Error),
    /// Writing the frame to the device failed.
    Io(io::Error),
    /// The link was used after `close`.
    Closed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::DeviceNotFound { vid, pid } => {
                write!(f, "no DMX adapter found for {vid:04x}:{pid:04x}")
            }
            LinkError::Serial(err) => write!(f, "serial port error: {err}"),
            LinkError::Io(err) => write!(f, "DMX write error: {err}"),
            LinkError::Closed => write!(f, "DMX link is closed"),
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LinkError::Serial(err) => Some(err),
            LinkError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serialport::Error> for LinkError {
    fn from(err: serialport::Error) -> Self {
        LinkError::Serial(err)
    }
}

impl From<io::Error> for LinkError {
    fn from(err: io::Error) -> Self {
        LinkError::Io(err)
    }
}

/// Result type alias for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;
