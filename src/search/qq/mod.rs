//! QQ Music (catalog A)
//!
//! Search goes through the desktop client's `musicu.fcg` gateway (a JSON
//! POST); lyrics come from the `fcg_query_lyric_new` endpoint with the
//! translation stream in a separate field. Cover URLs are built from the
//! album mid and probed for reachability, falling back to the song's
//! alternate image ids.

pub mod dto;
mod adapter;
mod client;

pub use adapter::{to_hit, QqHit};
pub use client::{QqClient, QqEndpoints};
