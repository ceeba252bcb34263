//! Master server for the A2S game-server discovery protocol.
//!
//! Game servers announce themselves with UDP heartbeats, the [`storage`]
//! registry remembers them, the [`sweeper`] drops the silent ones and asks the
//! rest for their name, map and player count, and [`handlers`] serve the
//! resulting list over HTTP.

pub mod config;
pub mod handlers;
pub mod models;
pub mod protocol;
pub mod query;
pub mod storage;
pub mod sweeper;
pub mod utils;
