//! NTP time-tag evaluation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rosc::OscTime;

/// Seconds between the NTP epoch (1 Jan 1900) and the Unix epoch.
pub const JAN_1970: u64 = 2_208_988_800;

/// The OSC "immediate" sentinel: seconds 0, fractional 1.
pub const IMMEDIATE: OscTime = OscTime {
    seconds: 0,
    fractional: 1,
};

/// A resolved OSC time-tag.
///
/// `Immediate` bypasses the scheduler entirely; `At` carries the
/// wall-clock instant the tagged messages fall due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timetag {
    Immediate,
    At(SystemTime),
}

impl From<OscTime> for Timetag {
    fn from(time: OscTime) -> Self {
        if time == IMMEDIATE {
            return Timetag::Immediate;
        }

        // NTP seconds since 1900 with a 32-bit binary fraction.
        // Pre-1970 tags saturate to the epoch and fall due at once.
        let seconds = u64::from(time.seconds).saturating_sub(JAN_1970);
        let nanos = (u64::from(time.fractional) * 1_000_000_000) >> 32;

        Timetag::At(UNIX_EPOCH + Duration::new(seconds, nanos as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_sentinel() {
        let tag = Timetag::from(OscTime {
            seconds: 0,
            fractional: 1,
        });
        assert_eq!(tag, Timetag::Immediate);
    }

    #[test]
    fn test_zero_fraction_is_not_immediate() {
        let tag = Timetag::from(OscTime {
            seconds: 0,
            fractional: 0,
        });
        assert_eq!(tag, Timetag::At(UNIX_EPOCH));
    }

    #[test]
    fn test_epoch_offset() {
        let tag = Timetag::from(OscTime {
            seconds: (JAN_1970 + 10) as u32,
            fractional: 0,
        });
        assert_eq!(tag, Timetag::At(UNIX_EPOCH + Duration::from_secs(10)));
    }

    #[test]
    fn test_fraction_uses_full_32_bits() {
        let tag = Timetag::from(OscTime {
            seconds: JAN_1970 as u32,
            fractional: 0x8000_0000,
        });
        assert_eq!(tag, Timetag::At(UNIX_EPOCH + Duration::from_millis(500)));
    }

    #[test]
    fn test_pre_unix_epoch_saturates() {
        let tag = Timetag::from(OscTime {
            seconds: 1000,
            fractional: 0,
        });
        assert_eq!(tag, Timetag::At(UNIX_EPOCH));
    }
}
