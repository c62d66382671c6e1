//! QQ Music API Data Transfer Objects
//!
//! These types match what the QQ Music endpoints return. Most fields are
//! optional or defaulted because the gateway omits whole blocks when a
//! search finds nothing. Do not use these types outside the qq module.

use serde::{Deserialize, Serialize};

/// Envelope of the `musicu.fcg` search gateway
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub req: Option<RequestBlock>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RequestBlock {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub data: Option<RequestData>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RequestData {
    #[serde(default)]
    pub body: Option<SearchBody>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchBody {
    #[serde(default)]
    pub song: Option<SongList>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SongList {
    #[serde(default)]
    pub list: Vec<Song>,
}

/// One song in the search results
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Song {
    /// Song mid, used for the lyric lookup
    #[serde(default)]
    pub mid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub album: Album,
    #[serde(default)]
    pub singer: Vec<Singer>,
    /// Alternate image ids, used as cover fallbacks
    #[serde(default)]
    pub vs: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Album {
    #[serde(default)]
    pub mid: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Singer {
    #[serde(default)]
    pub name: String,
}

/// Lyric endpoint response (requested with `nobase64=1`)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LyricResponse {
    #[serde(default)]
    pub lyric: String,
    /// Translation stream, empty when the song has none
    #[serde(default)]
    pub trans: String,
}

impl SearchResponse {
    /// Songs in the response, empty when any level is missing.
    pub fn into_songs(self) -> Vec<Song> {
        self.req
            .and_then(|r| r.data)
            .and_then(|d| d.body)
            .and_then(|b| b.song)
            .map(|s| s.list)
            .unwrap_or_default()
    }
}

/// Build the JSON body for a keyword search.
pub fn search_request(keyword: &str, per_page: usize) -> serde_json::Value {
    serde_json::json!({
        "comm": { "ct": "19", "cv": "1859", "uin": "0" },
        "req": {
            "method": "DoSearchForQQMusicDesktop",
            "module": "music.search.SearchCgiService",
            "param": {
                "grp": 1,
                "num_per_page": per_page,
                "page_num": 1,
                "query": keyword,
                "search_type": 0
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "code": 0,
            "req": {
                "code": 0,
                "data": {
                    "body": {
                        "song": {
                            "list": [{
                                "mid": "003OUlho2HcRHC",
                                "name": "晴天",
                                "album": {"mid": "000MkMni19ClKG", "title": "叶惠美"},
                                "singer": [{"name": "周杰伦"}],
                                "vs": ["", "abcd1234"]
                            }]
                        }
                    }
                }
            }
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let songs = response.into_songs();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].name, "晴天");
        assert_eq!(songs[0].album.mid, "000MkMni19ClKG");
        assert_eq!(songs[0].singer[0].name, "周杰伦");
        assert_eq!(songs[0].vs.len(), 2);
    }

    #[test]
    fn test_missing_blocks_yield_no_songs() {
        let response: SearchResponse = serde_json::from_str(r#"{"code":0,"req":{"code":2001}}"#).unwrap();
        assert!(response.into_songs().is_empty());
    }

    #[test]
    fn test_search_request_shape() {
        let body = search_request("晴天 周杰伦", 10);
        assert_eq!(body["req"]["param"]["query"], "晴天 周杰伦");
        assert_eq!(body["req"]["param"]["num_per_page"], 10);
        assert_eq!(body["req"]["module"], "music.search.SearchCgiService");
    }
}
