//! Category/Episode model assembly
//!
//! Drives Fetcher → Extractor and turns page skeletons into the canonical
//! [`crate::models`] entities. Building a category never resolves episode
//! streams eagerly; resolution happens when a specific episode or a direct
//! playlist is actually requested.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;
use url::Url;

use crate::config::UpstreamConfig;
use crate::errors::{AppError, AppResult, FetchError, ParseError};
use crate::models::{Category, Episode};
use crate::upstream::extractor::{self, CategorySkeleton, PageKind};
use crate::upstream::fetcher::PageFetcher;
use crate::upstream::resolver::EmbeddedPayload;

/// What an arbitrary upstream URL turned out to be
pub enum BuiltPage {
    Category(Category),
    Episode(Episode),
}

pub struct ModelBuilder {
    fetcher: Arc<PageFetcher>,
    base_url: String,
    host: String,
}

impl ModelBuilder {
    pub fn new(fetcher: Arc<PageFetcher>, config: &UpstreamConfig) -> Self {
        Self {
            fetcher,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            host: config.host(),
        }
    }

    /// Whether a client-supplied URL belongs to the upstream site (the main
    /// host or any of its subdomains)
    pub fn is_upstream_url(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .map(|h| h == self.host || h.ends_with(&format!(".{}", self.host)))
            .unwrap_or(false)
    }

    /// Canonical category URL for a raw id
    pub fn category_url(&self, id: &str) -> String {
        format!("{}/?cat={}", self.base_url, id)
    }

    /// Canonical page URL for a single episode post
    pub fn episode_url(&self, post_id: &str) -> String {
        format!("{}/{}", self.base_url, post_id)
    }

    fn target_url(&self, target: &str) -> AppResult<String> {
        if !target.is_empty() && target.chars().all(|c| c.is_ascii_digit()) {
            return Ok(self.category_url(target));
        }
        if self.is_upstream_url(target) {
            return Ok(target.to_string());
        }
        Err(AppError::validation(format!(
            "'{target}' is neither a category id nor an upstream URL"
        )))
    }

    /// Build a category from a full upstream URL or a raw numeric id
    pub async fn build(&self, target: &str) -> AppResult<Category> {
        let url = self.target_url(target)?;
        let html = self.fetcher.fetch_page(&url).await?;
        Ok(finalize(extractor::extract_category(&html)?))
    }

    /// Interpret an arbitrary (already validated) upstream URL, which may be
    /// a category listing or a single episode post
    pub async fn describe(&self, url: &str) -> AppResult<BuiltPage> {
        let html = self.fetcher.fetch_page(url).await?;
        match extractor::classify(&html)? {
            PageKind::Category => Ok(BuiltPage::Category(finalize(extractor::extract_category(
                &html,
            )?))),
            PageKind::SinglePost => Ok(BuiltPage::Episode(extractor::extract_single_post(&html)?)),
        }
    }

    /// Id-based category lookup for `/c/{id}`.
    ///
    /// An id the upstream does not recognize serves a page without category
    /// markers (or a plain 404); both surface as `NotFound`, never as an
    /// empty-but-successful category.
    pub async fn category(&self, id: &str) -> AppResult<Category> {
        let url = self.category_url(id);
        let html = match self.fetcher.fetch_page(&url).await {
            Ok(html) => html,
            Err(FetchError::HttpStatus { status: 404, .. }) => {
                return Err(AppError::not_found("category", id));
            }
            Err(e) => return Err(e.into()),
        };
        match extractor::classify(&html) {
            Ok(PageKind::Category) => {}
            Ok(PageKind::SinglePost) | Err(ParseError::UnknownPageKind) => {
                return Err(AppError::not_found("category", id));
            }
            Err(e) => return Err(e.into()),
        }
        Ok(finalize(extractor::extract_category(&html)?))
    }

    /// Re-fetch one episode page, yielding the episode and its embedded
    /// payload for stream resolution
    pub async fn episode(&self, post_id: &str) -> AppResult<(Episode, EmbeddedPayload)> {
        let url = self.episode_url(post_id);
        let html = match self.fetcher.fetch_page(&url).await {
            Ok(html) => html,
            Err(FetchError::HttpStatus { status: 404, .. }) => {
                return Err(AppError::not_found("episode", post_id));
            }
            Err(e) => return Err(e.into()),
        };
        match extractor::classify(&html) {
            Ok(PageKind::SinglePost) => {}
            Ok(PageKind::Category) | Err(ParseError::UnknownPageKind) => {
                return Err(AppError::not_found("episode", post_id));
            }
            Err(e) => return Err(e.into()),
        }
        let episode = extractor::extract_single_post(&html)?;
        let payload = extractor::extract_embedded_payload(&html)?;
        Ok((episode, payload))
    }
}

/// Wrap a skeleton into a Category, deduplicating episode ids. First
/// occurrence wins; duplicates mean malformed upstream markup.
fn finalize(skeleton: CategorySkeleton) -> Category {
    let mut seen = HashSet::new();
    let mut episodes = Vec::with_capacity(skeleton.episodes.len());
    for episode in skeleton.episodes {
        if seen.insert(episode.id.clone()) {
            episodes.push(episode);
        } else {
            warn!(
                "Dropping duplicate episode id {} in category {}",
                episode.id, skeleton.id
            );
        }
    }
    Category {
        id: skeleton.id,
        title: skeleton.title,
        episodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;

    fn builder() -> ModelBuilder {
        let config = UpstreamConfig::default();
        let fetcher = Arc::new(PageFetcher::new(&config).unwrap());
        ModelBuilder::new(fetcher, &config)
    }

    fn episode(id: &str, title: &str) -> Episode {
        Episode {
            id: id.to_string(),
            title: title.to_string(),
            category_id: "90".to_string(),
            order: None,
            date: None,
        }
    }

    #[test]
    fn upstream_url_validation_accepts_host_and_subdomains() {
        let builder = builder();
        assert!(builder.is_upstream_url("https://anime1.me/?cat=90"));
        assert!(builder.is_upstream_url("https://anime1.me/2013/%E9%80%B2%E6%93%8A"));
        assert!(builder.is_upstream_url("https://v.anime1.me/api"));
        assert!(!builder.is_upstream_url("https://example.com/?cat=90"));
        assert!(!builder.is_upstream_url("not a url"));
    }

    #[test]
    fn numeric_targets_map_to_the_canonical_category_url() {
        let builder = builder();
        assert_eq!(
            builder.target_url("90").unwrap(),
            "https://anime1.me/?cat=90"
        );
        let passthrough = builder.target_url("https://anime1.me/?cat=90").unwrap();
        assert_eq!(passthrough, "https://anime1.me/?cat=90");
        assert!(builder.target_url("https://example.com/x").is_err());
        assert!(builder.target_url("").is_err());
    }

    #[test]
    fn finalize_keeps_first_occurrence_of_duplicate_ids() {
        let skeleton = CategorySkeleton {
            id: "90".to_string(),
            title: "進擊的巨人".to_string(),
            episodes: vec![
                episode("1213", "進擊的巨人 [01]"),
                episode("1214", "進擊的巨人 [02]"),
                episode("1213", "進擊的巨人 [01] (重複)"),
            ],
        };
        let category = finalize(skeleton);
        assert_eq!(category.episodes.len(), 2);
        assert_eq!(category.episodes[0].title, "進擊的巨人 [01]");
    }
}
