//! KuGou API Data Transfer Objects
//!
//! KuGou mixes numbers and strings for ids across endpoints, so id fields
//! are read through [`string_or_number`]. Do not use these types outside
//! the kugou module.

use serde::{Deserialize, Deserializer, Serialize};

/// `api/v3/search/song` response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub data: Option<SearchData>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchData {
    #[serde(default)]
    pub info: Vec<Song>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Song {
    #[serde(default)]
    pub songname: String,
    #[serde(default)]
    pub singername: String,
    /// Audio hash, key for lyrics and cover lookups
    #[serde(default)]
    pub hash: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub album_id: String,
    #[serde(default)]
    pub album_name: String,
}

/// `krcs.kugou.com/search` response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LyricSearchResponse {
    #[serde(default)]
    pub candidates: Vec<LyricCandidate>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LyricCandidate {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub accesskey: String,
}

/// `lyrics.kugou.com/download` response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LyricDownloadResponse {
    #[serde(default)]
    pub status: i64,
    /// Base64-encoded LRC
    #[serde(default)]
    pub content: String,
}

/// `yy/index.php?r=play/getdata` response. `data` is an empty array on
/// failure and an object on success.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayDataResponse {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl SearchResponse {
    pub fn into_songs(self) -> Vec<Song> {
        self.data.map(|d| d.info).unwrap_or_default()
    }
}

impl PlayDataResponse {
    pub fn image(&self) -> Option<&str> {
        self.data
            .get("img")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Accept `"123"`, `123` or `null`.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}
