//! NetEase Cloud Music (catalog B)
//!
//! Song search uses the `cloudsearch/pc` endpoint; songs can carry aliases
//! that count as alternative titles. Lyrics come with a separate
//! translation stream. Without a title the client switches to artwork
//! lookup: an album picture when artist and album are known, otherwise the
//! artist portrait.

pub mod dto;
mod adapter;
mod client;

pub use adapter::{to_hit, NeteaseHit};
pub use client::NeteaseClient;
