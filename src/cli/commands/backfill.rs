//! Library backfill: fill in missing lyrics and artwork for a directory.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::library::{self, LibraryTrack, ScanEvent};
use crate::search::{
    self, AttributeOutcome, BatchProgress, ResolvedCover, TrackResolution, http,
};

/// Resolve every track under `path` that is missing a `.lrc` or cover file
pub fn cmd_backfill(rt: &Runtime, config: &Config, path: &Path, write: bool) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("{} does not exist", path.display());
    }
    rt.block_on(run_backfill(config, path, write))
}

async fn run_backfill(config: &Config, path: &Path, write: bool) -> anyhow::Result<()> {
    let resolver = search::resolver_from_config(config)?;
    println!("Scanning {}...", path.display());

    let mut tracks: Vec<LibraryTrack> = Vec::new();
    let mut unreadable = 0;
    let mut events = Box::pin(library::scan_library(path.to_path_buf()));
    while let Some(event) = events.next().await {
        match event {
            ScanEvent::Found(track) => tracks.push(track),
            ScanEvent::Error(p, e) => {
                tracing::warn!("Skipping {:?}: {}", p, e);
                unreadable += 1;
            }
        }
    }

    let total = tracks.len();
    tracks.retain(|t| !t.needs().is_empty());
    println!(
        "Found {} track(s), {} complete, {} to resolve, {} unreadable\n",
        total,
        total - tracks.len(),
        tracks.len(),
        unreadable
    );
    if tracks.is_empty() {
        return Ok(());
    }

    let requests = tracks.iter().map(LibraryTrack::to_request).collect();
    let progress = Mutex::new(BatchProgress::default());
    let results = resolver.resolve_batch(requests, &progress).await;

    let client = http::build_client(
        None,
        None,
        Duration::from_millis(config.providers.request_timeout_ms),
    )?;

    let mut written = 0;
    for track in &tracks {
        let Some(resolution) = results.get(&track.id()) else {
            continue;
        };
        print_resolution(track, resolution);
        if write {
            written += write_outputs(&client, track, resolution).await;
        }
    }

    let progress = *progress.lock();
    println!();
    println!(
        "Done! {} processed, {} complete, {} with missing attributes",
        progress.processed,
        progress.processed - progress.failed,
        progress.failed
    );
    if write {
        println!("{} file(s) written", written);
    } else {
        println!("Run with --write to save .lrc and cover files.");
    }
    Ok(())
}

fn outcome_label<T>(outcome: &AttributeOutcome<T>) -> String {
    match outcome {
        AttributeOutcome::Filled { source, .. } => format!("✓ {}", source),
        AttributeOutcome::NotNeeded => "-".to_string(),
        AttributeOutcome::Missing => "✗".to_string(),
    }
}

fn print_resolution(track: &LibraryTrack, resolution: &TrackResolution) {
    let name = track
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("?");
    println!(
        "{}  cover: {}  lyrics: {}  ({} attempt(s))",
        name,
        outcome_label(&resolution.cover),
        outcome_label(&resolution.lyrics),
        resolution.attempts
    );
}

/// Write sidecars for whatever was filled remotely. Returns files written.
async fn write_outputs(
    client: &reqwest::Client,
    track: &LibraryTrack,
    resolution: &TrackResolution,
) -> usize {
    let mut written = 0;

    if let AttributeOutcome::Filled { value, .. } = &resolution.lyrics {
        match library::write_lyrics(&track.path, value) {
            Ok(_) => written += 1,
            Err(e) => eprintln!("  ✗ lyrics for {:?}: {}", track.path, e),
        }
    }

    // Local artwork is already in the file or next to it
    if let AttributeOutcome::Filled {
        value: ResolvedCover::Remote(url),
        ..
    } = &resolution.cover
    {
        match library::download_cover(client, &track.path, url).await {
            Ok(_) => written += 1,
            Err(e) => eprintln!("  ✗ cover for {:?}: {}", track.path, e),
        }
    }
    written
}
