//! Core data models for the anime1-proxy application
//!
//! Every entity here is built fresh per request from a page snapshot; nothing
//! is shared mutable across concurrent requests. Re-fetching a category
//! produces new values rather than mutating old ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One playable unit within a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Opaque upstream post identifier, globally unique across categories
    pub id: String,
    /// Display title, typically `"<category title> [<index>]"`
    pub title: String,
    /// Back-reference to the owning category (lookup only)
    pub category_id: String,
    /// Episode index parsed from the `[n]` suffix of the title, when present
    pub order: Option<u32>,
    /// Upstream publication datetime string, as-is
    pub date: Option<String>,
}

/// A named grouping of episodes (one series/season)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Opaque upstream category identifier
    pub id: String,
    /// Display title, original script preserved
    pub title: String,
    /// Episodes in upstream display order, ids unique within the category
    pub episodes: Vec<Episode>,
}

/// The final, directly playable media location for one episode
///
/// Created on demand per resolution request and owned by that request; the
/// only thing that retains one longer is the in-memory stream cache, bounded
/// by `expires_at`.
#[derive(Debug, Clone)]
pub struct ResolvedStream {
    pub episode_id: String,
    /// Absolute URL to the playable resource, may be short-lived
    pub media_url: String,
    /// Media content type reported by the resolution endpoint
    pub content_type: String,
    pub resolved_at: DateTime<Utc>,
    /// Past this instant the URL is assumed stale and must be re-resolved
    pub expires_at: DateTime<Utc>,
}

impl ResolvedStream {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Serving mode for the `/v/{id}` endpoint
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StreamMode {
    /// 302 to the resolved upstream URL; fastest, but exposes the expiring URL
    Redirect,
    /// Relay upstream bytes through this server, honoring range requests
    #[default]
    Proxy,
}

/// Absolute links to every playlist rendition of one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistLinks {
    pub m3u8: String,
    pub dpl: String,
    pub dpl_ext: String,
    pub xspf: String,
    pub xspf_ext: String,
}

/// One video entry inside a category descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRef {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// JSON descriptor returned by `/p` for a client-supplied upstream URL
///
/// All URLs point back at this local server, never at upstream media, so
/// expiring upstream links never leak into saved playlists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UrlDescriptor {
    Category {
        id: String,
        title: String,
        url: String,
        playlists: PlaylistLinks,
        videos: Vec<VideoRef>,
    },
    Single {
        id: String,
        title: String,
        category: String,
        url: String,
    },
}

/// One entry of the `/l` recently-seen listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentCategory {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Present only in the expanded (`?ex=1`) listing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlists: Option<PlaylistLinks>,
}

impl PlaylistLinks {
    /// Build the playlist link map for one category relative to `base_url`
    pub fn for_category(base_url: &str, category_id: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let link = |kind: &str| format!("{base}/c/{category_id}?playlist={kind}");
        Self {
            m3u8: link("m3u8"),
            dpl: link("dpl"),
            dpl_ext: link("dpl_ext"),
            xspf: link("xspf"),
            xspf_ext: link("xspf_ext"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stream_mode_parses_case_insensitively() {
        assert_eq!(StreamMode::from_str("proxy").unwrap(), StreamMode::Proxy);
        assert_eq!(
            StreamMode::from_str("Redirect").unwrap(),
            StreamMode::Redirect
        );
        assert!(StreamMode::from_str("tunnel").is_err());
    }

    #[test]
    fn descriptor_serializes_with_type_tag() {
        let descriptor = UrlDescriptor::Single {
            id: "1213".to_string(),
            title: "進擊的巨人 [01]".to_string(),
            category: "90".to_string(),
            url: "http://127.0.0.1:8520/v/1213".to_string(),
        };
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["type"], "single");
        assert_eq!(value["id"], "1213");
    }

    #[test]
    fn playlist_links_share_the_category_endpoint() {
        let links = PlaylistLinks::for_category("http://127.0.0.1:8520/", "90");
        assert_eq!(links.m3u8, "http://127.0.0.1:8520/c/90?playlist=m3u8");
        assert_eq!(links.xspf_ext, "http://127.0.0.1:8520/c/90?playlist=xspf_ext");
    }
}
