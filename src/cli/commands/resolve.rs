//! Single-track resolution across all catalogs.

use tokio::runtime::Runtime;

use super::print_field;
use crate::config::Config;
use crate::search::{self, Candidate, Query, SearchError};

/// Find the best cover and lyrics for one track
pub fn cmd_resolve(
    rt: &Runtime,
    config: &Config,
    query: &Query,
    show_lyrics: bool,
    json: bool,
) -> anyhow::Result<()> {
    let resolver = search::resolver_from_config(config)?;

    let best = rt.block_on(resolver.resolve(query));
    match best {
        Ok(Some(candidate)) if json => {
            println!("{}", serde_json::to_string_pretty(&candidate)?);
        }
        Ok(Some(candidate)) => print_candidate(&candidate, show_lyrics),
        Ok(None) if json => println!("null"),
        Ok(None) => {
            println!("✗ No match found for \"{}\"", query.keyword());
        }
        Err(SearchError::EmptyQuery) => {
            anyhow::bail!("no query provided: give at least a title, artist or album");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub(crate) fn print_candidate(candidate: &Candidate, show_lyrics: bool) {
    println!(
        "✓ {} - {} (from {})",
        candidate.artist, candidate.title, candidate.source
    );
    print_field("Album", &candidate.album);
    print_field("Cover", candidate.cover.as_deref().unwrap_or(""));
    if candidate.has_lyrics() {
        let lines = candidate.lyrics.lines().count();
        let translated = if candidate.has_translation {
            ", bilingual"
        } else {
            ""
        };
        print_field("Lyrics", &format!("{} lines{}", lines, translated));
    } else {
        print_field("Lyrics", "none");
    }

    if show_lyrics && candidate.has_lyrics() {
        println!();
        println!("{}", candidate.lyrics);
    }
}
