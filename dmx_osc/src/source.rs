//! Packet sources: where raw OSC datagrams come from.

use std::{
    io,
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
    time::Duration,
};

use log::info;

use crate::error::{Result, SourceError};

/// URI scheme for OSC over UDP, as in `osc.udp://:6666`.
const UDP_SCHEME: &str = "osc.udp://";

/// A blocking source of raw OSC datagrams.
///
/// Implementations must return whole datagrams; the bridge never
/// reassembles partial packets.
pub trait PacketSource: Send {
    /// Waits up to `timeout` for the next datagram and copies it
    /// into `buf`.
    ///
    /// Returns `Ok(None)` when the timeout elapses, `Ok(Some(len))`
    /// on receipt. Datagrams longer than `buf` are truncated by the
    /// transport and will fail OSC decoding downstream.
    fn recv_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>>;
}

/// OSC-over-UDP packet source.
pub struct UdpPacketSource {
    socket: UdpSocket,
    timeout: Option<Duration>,
}

impl UdpPacketSource {
    /// Binds a UDP socket from an `osc.udp://[host]:port` URI.
    /// An empty host listens on all interfaces.
    pub fn bind(uri: &str) -> Result<Self> {
        let addr = parse_udp_uri(uri)?;
        let socket = UdpSocket::bind(addr)?;
        info!("listening for OSC on {}", socket.local_addr()?);

        Ok(Self {
            socket,
            timeout: None,
        })
    }

    /// The bound local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl PacketSource for UdpPacketSource {
    fn recv_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        if self.timeout != Some(timeout) {
            self.socket.set_read_timeout(Some(timeout))?;
            self.timeout = Some(timeout);
        }

        match self.socket.recv_from(buf) {
            Ok((len, _)) => Ok(Some(len)),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

fn parse_udp_uri(uri: &str) -> Result<SocketAddr> {
    let rest = match uri.strip_prefix(UDP_SCHEME) {
        Some(rest) => rest,
        None => return Err(SourceError::UnsupportedScheme(uri.to_string())),
    };

    let (host, port) = rest
        .rsplit_once(':')
        .ok_or_else(|| SourceError::InvalidUri(uri.to_string()))?;
    let port: u16 = port
        .parse()
        .map_err(|_| SourceError::InvalidUri(uri.to_string()))?;

    let host = if host.is_empty() {
        "0.0.0.0"
    } else {
        host.trim_start_matches('[').trim_end_matches(']')
    };

    (host, port)
        .to_socket_addrs()
        .map_err(|_| SourceError::InvalidUri(uri.to_string()))?
        .next()
        .ok_or_else(|| SourceError::InvalidUri(uri.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_uri() {
        let addr = parse_udp_uri("osc.udp://:6666").unwrap();
        assert_eq!(addr.port(), 6666);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_parse_explicit_host() {
        let addr = parse_udp_uri("osc.udp://127.0.0.1:9000").unwrap();
        assert_eq!(addr.port(), 9000);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_parse_ipv6_host() {
        let addr = parse_udp_uri("osc.udp://[::1]:9000").unwrap();
        assert_eq!(addr.port(), 9000);
        assert!(addr.is_ipv6());
    }

    #[test]
    fn test_reject_other_schemes() {
        assert!(matches!(
            parse_udp_uri("osc.tcp://:6666"),
            Err(SourceError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            parse_udp_uri("6666"),
            Err(SourceError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_reject_missing_or_bad_port() {
        assert!(matches!(
            parse_udp_uri("osc.udp://localhost"),
            Err(SourceError::InvalidUri(_))
        ));
        assert!(matches!(
            parse_udp_uri("osc.udp://:notaport"),
            Err(SourceError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_bound_socket_times_out_when_idle() {
        let mut source = UdpPacketSource::bind("osc.udp://127.0.0.1:0").unwrap();
        let mut buf = [0u8; 64];

        let received = source
            .recv_timeout(&mut buf, Duration::from_millis(5))
            .unwrap();
        assert_eq!(received, None);
    }

    #[test]
    fn test_datagram_roundtrip() {
        let mut source = UdpPacketSource::bind("osc.udp://127.0.0.1:0").unwrap();
        let target = source.local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(b"/dmx", target).unwrap();

        let mut buf = [0u8; 64];
        let len = loop {
            if let Some(len) = source
                .recv_timeout(&mut buf, Duration::from_millis(100))
                .unwrap()
            {
                break len;
            }
        };
        assert_eq!(&buf[..len], b"/dmx");
    }
}
