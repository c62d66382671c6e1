//! Un-aggregated lookup against one catalog, for diagnostics.

use std::time::Instant;

use tokio::runtime::Runtime;

use super::print_field;
use crate::config::Config;
use crate::search::{self, Provider, Query, Source};

/// Query a single catalog and list what it returns
pub fn cmd_search(
    rt: &Runtime,
    config: &Config,
    provider: &str,
    query: &Query,
    json: bool,
) -> anyhow::Result<()> {
    let Some(source) = Source::parse(provider) else {
        anyhow::bail!(
            "unknown provider {:?} (expected one of: {})",
            provider,
            Source::ALL.map(Source::tag).join(", ")
        );
    };

    let client = search::build_provider(source, config.providers.options_for(source))?;

    let started = Instant::now();
    let candidates = rt.block_on(client.try_search(query))?;
    tracing::debug!(source = %source, elapsed_ms = started.elapsed().as_millis() as u64, "search finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    if candidates.is_empty() {
        println!("✗ {} returned no matches for \"{}\"", source, query.keyword());
        return Ok(());
    }

    println!("{} result(s) from {} (catalog {}):", candidates.len(), source, source.letter());
    for candidate in &candidates {
        println!();
        println!("#{} {} - {}", candidate.platform_rank + 1, candidate.artist, candidate.title);
        print_field("Album", &candidate.album);
        print_field("Cover", candidate.cover.as_deref().unwrap_or("none"));
        print_field("Lyrics", &candidate.lyrics_preview());
    }
    Ok(())
}
