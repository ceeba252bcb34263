// src/handlers/heartbeat.rs
use log::{debug, info, warn};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use crate::storage::memory::ServerRegistry;

/// Largest datagram read from the announcement socket.
const MAX_DATAGRAM: usize = 1024;

/// First bytes of the master-server messages a game server sends on its own:
/// challenge request, GoldSrc heartbeat and the Source list opcode.
const ANNOUNCEMENT_OPCODES: [u8; 3] = [b'q', b'0', b'1'];

/// Decides which datagrams count as a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatFilter {
    /// Any non-empty payload admits the sender.
    Any,
    /// The payload must start with a known announcement opcode.
    Announcement,
}

impl HeartbeatFilter {
    pub fn accepts(&self, payload: &[u8]) -> bool {
        match (self, payload.first()) {
            (_, None) => false,
            (Self::Any, Some(_)) => true,
            (Self::Announcement, Some(op)) => ANNOUNCEMENT_OPCODES.contains(op),
        }
    }
}

impl FromStr for HeartbeatFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "announcement" => Ok(Self::Announcement),
            other => Err(format!("Unknown heartbeat filter: {}", other)),
        }
    }
}

impl fmt::Display for HeartbeatFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Announcement => write!(f, "announcement"),
        }
    }
}

/// Receives announcement datagrams and admits their senders.
pub struct HeartbeatListener {
    socket: UdpSocket,
    registry: Arc<ServerRegistry>,
    filter: HeartbeatFilter,
}

impl HeartbeatListener {
    /// Binds the announcement socket. Callers treat failure as fatal.
    pub async fn bind(
        addr: &str,
        registry: Arc<ServerRegistry>,
        filter: HeartbeatFilter,
    ) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!(
            "Master server (UDP) listening on {} with {} heartbeat filter",
            socket.local_addr()?,
            filter
        );
        Ok(Self {
            socket,
            registry,
            filter,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Applies one received datagram. Returns whether the sender was touched.
    pub fn handle_datagram(&self, payload: &[u8], from: SocketAddr) -> bool {
        if !self.filter.accepts(payload) {
            debug!("Ignoring {} byte datagram from {}", payload.len(), from);
            return false;
        }

        if self.registry.touch(from) {
            info!("New server detected: {}", from);
        }
        true
    }

    /// Receive loop. Never returns; socket errors are logged and skipped.
    pub async fn run(self) {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, from)) => {
                    self.handle_datagram(&buf[..len], from);
                }
                Err(e) => {
                    warn!("Heartbeat receive error: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_filter() {
        assert!(!HeartbeatFilter::Any.accepts(b""));
        assert!(HeartbeatFilter::Any.accepts(b"x"));
        assert!(HeartbeatFilter::Any.accepts(&[0xFF, 0x00]));
    }

    #[test]
    fn test_announcement_filter() {
        let filter = HeartbeatFilter::Announcement;
        assert!(filter.accepts(b"q"));
        assert!(filter.accepts(b"0\n\\protocol\\48\\challenge\\1\\"));
        assert!(filter.accepts(b"1\xFF0.0.0.0:0\0"));
        assert!(!filter.accepts(b"hello"));
        assert!(!filter.accepts(b""));
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!("any".parse::<HeartbeatFilter>(), Ok(HeartbeatFilter::Any));
        assert_eq!(
            "Announcement".parse::<HeartbeatFilter>(),
            Ok(HeartbeatFilter::Announcement)
        );
        assert!("strict".parse::<HeartbeatFilter>().is_err());
    }

    #[tokio::test]
    async fn test_handle_datagram_touches_sender() {
        let registry = Arc::new(ServerRegistry::new());
        let listener = HeartbeatListener::bind("127.0.0.1:0", registry.clone(), HeartbeatFilter::Any)
            .await
            .unwrap();
        let from: SocketAddr = "192.168.0.10:27015".parse().unwrap();

        assert!(listener.handle_datagram(b"q", from));
        assert!(listener.handle_datagram(b"q", from));
        assert!(!listener.handle_datagram(b"", from));

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&from).is_some());
    }
}
