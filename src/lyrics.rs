//! LRC lyric handling.
//!
//! Providers return lyrics in slightly different shapes: QQ and NetEase send
//! an original stream plus an optional translation stream, KuGou sends a
//! single Base64 payload. Everything is normalized here into ordered
//! `[mm:ss.xx]text` lines. For bilingual lyrics the translation follows the
//! original line that carries the same timestamp.

use std::collections::BTreeMap;

/// Placeholder providers put in translation slots with nothing to translate.
const EMPTY_TRANSLATION: &str = "//";

/// One timestamped lyric line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrcLine {
    /// Position in milliseconds
    pub time_ms: u64,
    pub text: String,
}

/// Result of merging an original stream with an optional translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedLyrics {
    pub text: String,
    pub has_translation: bool,
}

/// Parse `mm:ss`, `mm:ss.x`, `mm:ss.xx`, `mm:ss.xxx` or `mm:ss:xx` into milliseconds.
pub fn parse_timestamp(tag: &str) -> Option<u64> {
    let (minutes, rest) = tag.split_once(':')?;
    let minutes: u64 = minutes.trim().parse().ok()?;

    let (seconds, fraction) = match rest.split_once(['.', ':']) {
        Some((s, f)) => (s, Some(f)),
        None => (rest, None),
    };
    let seconds: u64 = seconds.trim().parse().ok()?;
    if seconds >= 60 {
        return None;
    }

    let millis = match fraction {
        Some(f) if !f.is_empty() => {
            if !f.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            // "5" -> 500ms, "05" -> 50ms, "005" -> 5ms
            let padded: String = f.chars().chain("000".chars()).take(3).collect();
            padded.parse::<u64>().ok()?
        }
        _ => 0,
    };

    minutes
        .checked_mul(60_000)?
        .checked_add(seconds * 1000 + millis)
}

/// Format milliseconds as `mm:ss.xx`.
pub fn format_timestamp(time_ms: u64) -> String {
    let minutes = time_ms / 60_000;
    let seconds = (time_ms % 60_000) / 1000;
    let centis = (time_ms % 1000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, centis)
}

/// Parse one raw line into zero or more timestamped lines.
///
/// `[00:01.00][00:30.00]chorus` yields two lines. Metadata tags such as
/// `[ar:Artist]` and untimed lines yield nothing.
fn parse_line(raw: &str) -> Vec<LrcLine> {
    let mut rest = raw.trim();
    let mut times = Vec::new();

    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(end) = stripped.find(']') else { break };
        match parse_timestamp(&stripped[..end]) {
            Some(ms) => times.push(ms),
            None => return Vec::new(),
        }
        rest = stripped[end + 1..].trim_start();
    }

    let text = rest.trim().to_string();
    times
        .into_iter()
        .map(|time_ms| LrcLine {
            time_ms,
            text: text.clone(),
        })
        .collect()
}

/// Parse LRC text into timestamped lines, keeping source order.
pub fn parse(text: &str) -> Vec<LrcLine> {
    text.lines().flat_map(parse_line).collect()
}

fn keep_text(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed != EMPTY_TRANSLATION
}

fn render(lines: impl IntoIterator<Item = LrcLine>) -> String {
    lines
        .into_iter()
        .map(|line| format!("[{}]{}", format_timestamp(line.time_ms), line.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalize single-language LRC: drop metadata tags and empty lines, sort
/// by time (stable for equal times), rewrite timestamps as `mm:ss.xx`.
pub fn normalize(text: &str) -> String {
    let mut lines: Vec<LrcLine> = parse(text).into_iter().filter(|l| keep_text(&l.text)).collect();
    lines.sort_by_key(|l| l.time_ms);
    render(lines)
}

/// Merge an original stream with a translation stream by timestamp.
///
/// For every timestamp the original lines come first, then the translated
/// ones. Lines are ordered ascending by time.
pub fn merge_bilingual(original: &str, translation: &str) -> MergedLyrics {
    let mut by_time: BTreeMap<u64, (Vec<String>, Vec<String>)> = BTreeMap::new();

    for line in parse(original) {
        if keep_text(&line.text) {
            by_time.entry(line.time_ms).or_default().0.push(line.text);
        }
    }

    let mut has_translation = false;
    for line in parse(translation) {
        if keep_text(&line.text) {
            has_translation = true;
            by_time.entry(line.time_ms).or_default().1.push(line.text);
        }
    }

    let lines = by_time.into_iter().flat_map(|(time_ms, (orig, trans))| {
        orig.into_iter()
            .chain(trans)
            .map(move |text| LrcLine { time_ms, text })
    });

    MergedLyrics {
        text: render(lines),
        has_translation,
    }
}

/// Ordered timestamp sequence of LRC text, in milliseconds.
pub fn split_timestamps(text: &str) -> Vec<u64> {
    parse(text).into_iter().map(|l| l.time_ms).collect()
}
