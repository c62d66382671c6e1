//! Metafill - cover art and synchronized lyrics for a music library.
//!
//! Given a track's title, artist and album, metafill searches three
//! external music catalogs, scores every candidate against the query and
//! returns the best cover URL and LRC lyrics it can find. The same engine
//! drives a batch backfill over a directory of audio files.
//!
//! Entry points:
//! - [`search::Resolver::resolve`] for one best-effort lookup
//! - [`search::Resolver::resolve_batch`] for many tracks with per-attribute needs
//! - [`search::Provider::search`] on any single catalog client

pub mod cli;
pub mod config;
pub mod cover;
pub mod error;
pub mod library;
pub mod lyrics;
pub mod search;
pub mod similarity;
