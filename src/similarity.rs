//! Text association scores used to compare query tags with provider results.
//!
//! Both functions take the QUERY value first. An empty query value means the
//! caller did not constrain that field, so it scores as fully satisfied.
//! All scores are deterministic and lie in `[0.0, 1.0]`.

use strsim::normalized_levenshtein;

/// Separators that join several artists in a single tag.
const ARTIST_SEPARATORS: &[char] = &['/', ',', '，', '、', '&', ';', '；', '|', '+'];

/// Collaboration markers that also separate artists.
const FEATURE_MARKERS: &[&str] = &[" feat. ", " feat ", " ft. ", " ft ", " featuring ", " x ", " with "];

/// Lowercase and drop all whitespace.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Remove bracketed suffixes such as `(Live)` or `【伴奏】`.
fn strip_brackets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' | '（' | '[' | '【' | '<' | '《' => depth += 1,
            ')' | '）' | ']' | '】' | '>' | '》' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn raw_association(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let edit = normalized_levenshtein(a, b);

    // "Song" vs "Song (Remastered)" should not be punished like a different title
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let containment = if a.contains(b) || b.contains(a) {
        let (short, long) = if a_len < b_len { (a_len, b_len) } else { (b_len, a_len) };
        0.5 + 0.5 * (short as f64 / long as f64)
    } else {
        0.0
    };

    edit.max(containment).clamp(0.0, 1.0)
}

/// Closeness between a query value and a candidate value.
///
/// Case- and whitespace-insensitive; identical normalized strings score 1.0.
pub fn association(query: &str, candidate: &str) -> f64 {
    let q = normalize(query);
    if q.is_empty() {
        return 1.0;
    }
    let c = normalize(candidate);
    let direct = raw_association(&q, &c);
    if direct >= 1.0 {
        return 1.0;
    }

    let q_bare = normalize(&strip_brackets(query));
    let c_bare = normalize(&strip_brackets(candidate));
    let bare = if q_bare.is_empty() || c_bare.is_empty() {
        0.0
    } else {
        raw_association(&q_bare, &c_bare) * 0.95
    };

    direct.max(bare)
}

/// Split a multi-artist field into individual names.
pub fn split_artists(field: &str) -> Vec<String> {
    let mut text = format!(" {} ", field.to_lowercase());
    for marker in FEATURE_MARKERS {
        text = text.replace(marker, "/");
    }
    text.split(|c: char| ARTIST_SEPARATORS.contains(&c) || c.is_whitespace())
        .map(normalize)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Mean best-match score of every name in `from` against the names in `to`.
fn coverage(from: &[String], to: &[String]) -> f64 {
    if from.is_empty() || to.is_empty() {
        return 0.0;
    }
    let total: f64 = from
        .iter()
        .map(|name| {
            to.iter()
                .map(|other| raw_association(name, other))
                .fold(0.0, f64::max)
        })
        .sum();
    total / from.len() as f64
}

/// Closeness between two artist fields that may each list several artists.
///
/// Rewards any plausible subset overlap: the same collaboration is often
/// credited in a different order, or with only some of its artists.
pub fn assoc_artists(query: &str, candidate: &str) -> f64 {
    if normalize(query).is_empty() {
        return 1.0;
    }
    let whole = association(query, candidate);
    if whole >= 1.0 {
        return 1.0;
    }

    let query_names = split_artists(query);
    let candidate_names = split_artists(candidate);
    let overlap = coverage(&query_names, &candidate_names)
        .max(coverage(&candidate_names, &query_names));

    whole.max(overlap).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identical_after_normalization() {
        assert_eq!(association("Hello World", "hello  world"), 1.0);
        assert_eq!(association("可能", "可能"), 1.0);
    }

    #[test]
    fn test_empty_query_is_satisfied() {
        assert_eq!(association("", "Anything"), 1.0);
        assert_eq!(association("   ", ""), 1.0);
        assert_eq!(assoc_artists("", "Someone"), 1.0);
    }

    #[test]
    fn test_empty_candidate_scores_zero() {
        assert_eq!(association("Song", ""), 0.0);
    }

    #[test]
    fn test_bracket_suffix_stays_close() {
        let score = association("晴天", "晴天 (Live)");
        assert!(score > 0.6, "score was {}", score);
        assert!(score < 1.0);
    }

    #[test]
    fn test_unrelated_titles_score_low() {
        assert!(association("Yesterday", "Bohemian Rhapsody") < 0.4);
    }

    #[test]
    fn test_split_artists() {
        assert_eq!(split_artists("周杰伦/费玉清"), vec!["周杰伦", "费玉清"]);
        assert_eq!(split_artists("A feat. B"), vec!["a", "b"]);
        assert_eq!(split_artists("陈奕迅、王菲"), vec!["陈奕迅", "王菲"]);
    }

    #[test]
    fn test_artists_in_different_order() {
        assert_eq!(assoc_artists("周杰伦/费玉清", "费玉清 周杰伦"), 1.0);
    }

    #[test]
    fn test_artist_subset_is_rewarded() {
        let score = assoc_artists("周杰伦", "周杰伦/费玉清");
        assert!(score >= 0.99, "score was {}", score);
        let reverse = assoc_artists("周杰伦/费玉清", "周杰伦");
        assert!(reverse >= 0.99, "score was {}", reverse);
    }

    #[test]
    fn test_artist_mismatch() {
        assert!(assoc_artists("程响", "Taylor Swift") < 0.3);
    }

    proptest! {
        #[test]
        fn association_stays_in_range(a in ".{0,24}", b in ".{0,24}") {
            let s = association(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        #[test]
        fn association_is_deterministic(a in ".{0,24}", b in ".{0,24}") {
            prop_assert_eq!(association(&a, &b), association(&a, &b));
        }

        #[test]
        fn association_of_self_is_one(a in ".{0,24}") {
            prop_assert_eq!(association(&a, &a), 1.0);
        }

        #[test]
        fn artists_stay_in_range(a in "[a-z/ ]{0,20}", b in "[a-z/ ]{0,20}") {
            let s = assoc_artists(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }
    }
}
