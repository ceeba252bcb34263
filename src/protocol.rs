// src/protocol.rs
//! A2S_INFO wire format.
//!
//! The master only needs the fixed request and the first few fields of the
//! reply. Decoding walks the buffer strictly in order and reports the first
//! field it could not read; nothing in here panics on hostile input.

use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::{BufRead, Cursor};
use crate::models::server::ServerStatus;

/// `FF FF FF FF 'T' "Source Engine Query" 00`
pub const INFO_REQUEST: [u8; 25] = *b"\xFF\xFF\xFF\xFFTSource Engine Query\0";

/// Four-byte packet marker plus the one-byte response type.
pub const HEADER_LEN: usize = 5;

const S2C_CHALLENGE: u8 = 0x41;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    MissingHeader(usize),
    Truncated(&'static str),
    Unterminated(&'static str),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader(len) => write!(f, "Response too short for header ({} bytes)", len),
            Self::Truncated(field) => write!(f, "Response truncated while reading {}", field),
            Self::Unterminated(field) => write!(f, "Missing string terminator for {}", field),
        }
    }
}

impl std::error::Error for DecodeError {}

pub fn encode_info_request() -> Vec<u8> {
    INFO_REQUEST.to_vec()
}

/// Request re-sent after the server answered with a challenge number.
pub fn encode_info_request_with_challenge(challenge: [u8; 4]) -> Vec<u8> {
    let mut packet = encode_info_request();
    packet.extend_from_slice(&challenge);
    packet
}

/// Returns the challenge number if `buf` is an `S2C_CHALLENGE` reply.
pub fn parse_challenge(buf: &[u8]) -> Option<[u8; 4]> {
    match buf {
        [0xFF, 0xFF, 0xFF, 0xFF, S2C_CHALLENGE, a, b, c, d, ..] => Some([*a, *b, *c, *d]),
        _ => None,
    }
}

pub fn decode_info_response(buf: &[u8]) -> Result<ServerStatus, DecodeError> {
    let body = buf
        .get(HEADER_LEN..)
        .ok_or(DecodeError::MissingHeader(buf.len()))?;
    let mut cursor = Cursor::new(body);

    cursor
        .read_u8()
        .map_err(|_| DecodeError::Truncated("protocol version"))?;
    let name = read_cstring(&mut cursor, "name")?;
    let map = read_cstring(&mut cursor, "map")?;
    read_cstring(&mut cursor, "folder")?;
    read_cstring(&mut cursor, "game")?;
    cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| DecodeError::Truncated("app id"))?;
    let players = cursor
        .read_u8()
        .map_err(|_| DecodeError::Truncated("players"))?;
    let max_players = cursor
        .read_u8()
        .map_err(|_| DecodeError::Truncated("max players"))?;

    Ok(ServerStatus {
        name,
        map,
        players,
        max_players,
    })
}

fn read_cstring(cursor: &mut Cursor<&[u8]>, field: &'static str) -> Result<String, DecodeError> {
    let mut bytes = Vec::new();
    cursor
        .read_until(0, &mut bytes)
        .map_err(|_| DecodeError::Truncated(field))?;
    if bytes.pop() != Some(0) {
        return Err(DecodeError::Unterminated(field));
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
