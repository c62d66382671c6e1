//! KuGou (catalog C)
//!
//! Lyrics take two chained calls: a candidate lookup by song hash that
//! yields an id and access key, then a download whose `content` field is
//! Base64-encoded LRC. Covers come from the web player's `getdata`
//! endpoint, which wants random device ids on every request.

pub mod dto;
mod adapter;
mod client;

pub use adapter::{to_hit, KugouHit};
pub use client::{KugouClient, KugouEndpoints};
