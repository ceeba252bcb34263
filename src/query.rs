// src/query.rs
use log::debug;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use crate::config::Config;
use crate::models::server::ServerStatus;
use crate::protocol::{
    decode_info_response, encode_info_request, encode_info_request_with_challenge,
    parse_challenge, DecodeError,
};
use crate::storage::memory::ServerRegistry;

/// Enough for any single-packet A2S_INFO reply.
const MAX_RESPONSE: usize = 1400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTimeouts {
    pub dial: Duration,
    pub read: Duration,
}

impl Default for QueryTimeouts {
    fn default() -> Self {
        Self {
            dial: Duration::from_secs(3),
            read: Duration::from_secs(2),
        }
    }
}

impl From<&Config> for QueryTimeouts {
    fn from(config: &Config) -> Self {
        Self {
            dial: config.dial_timeout(),
            read: config.read_timeout(),
        }
    }
}

#[derive(Debug)]
pub enum QueryError {
    Dial(io::Error),
    DialTimeout,
    Send(io::Error),
    Receive(io::Error),
    ReadTimeout,
    Decode(DecodeError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dial(e) => write!(f, "Dial failed: {}", e),
            Self::DialTimeout => write!(f, "Dial timed out"),
            Self::Send(e) => write!(f, "Send failed: {}", e),
            Self::Receive(e) => write!(f, "Receive failed: {}", e),
            Self::ReadTimeout => write!(f, "Timed out waiting for response"),
            Self::Decode(e) => write!(f, "Invalid response: {}", e),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<DecodeError> for QueryError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

async fn dial(target: SocketAddr) -> io::Result<UdpSocket> {
    let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(target).await?;
    Ok(socket)
}

async fn exchange(
    socket: &UdpSocket,
    request: &[u8],
    buf: &mut [u8],
    read_timeout: Duration,
) -> Result<usize, QueryError> {
    socket.send(request).await.map_err(QueryError::Send)?;
    match timeout(read_timeout, socket.recv(buf)).await {
        Ok(Ok(len)) => Ok(len),
        Ok(Err(e)) => Err(QueryError::Receive(e)),
        Err(_) => Err(QueryError::ReadTimeout),
    }
}

/// Sends one A2S_INFO request to `target` and decodes the reply.
///
/// A challenge reply is answered once with the challenge appended; every
/// other failure ends the query.
pub async fn fetch_status(
    target: SocketAddr,
    timeouts: QueryTimeouts,
) -> Result<ServerStatus, QueryError> {
    let socket = match timeout(timeouts.dial, dial(target)).await {
        Ok(Ok(socket)) => socket,
        Ok(Err(e)) => return Err(QueryError::Dial(e)),
        Err(_) => return Err(QueryError::DialTimeout),
    };

    let mut buf = [0u8; MAX_RESPONSE];
    let mut len = exchange(&socket, &encode_info_request(), &mut buf, timeouts.read).await?;

    if let Some(challenge) = parse_challenge(&buf[..len]) {
        debug!("Answering challenge from {}", target);
        let request = encode_info_request_with_challenge(challenge);
        len = exchange(&socket, &request, &mut buf, timeouts.read).await?;
    }

    Ok(decode_info_response(&buf[..len])?)
}

/// Queries `target` and stores the result if it is still registered.
/// Returns whether the registry was updated.
pub async fn query_server(
    registry: &ServerRegistry,
    target: SocketAddr,
    timeouts: QueryTimeouts,
) -> bool {
    match fetch_status(target, timeouts).await {
        Ok(status) => {
            debug!(
                "{} is \"{}\" on {} ({}/{})",
                target, status.name, status.map, status.players, status.max_players
            );
            if !registry.apply_status(&target, status) {
                debug!("Dropping status for {}: no longer registered", target);
                return false;
            }
            true
        }
        Err(e) => {
            debug!("Query to {} abandoned: {}", target, e);
            false
        }
    }
}
