//! Gateway service layer
//!
//! Orchestrates the resolution pipeline (fetch → extract → resolve) behind
//! the HTTP handlers, which stay thin. All state owned here is either
//! immutable after startup or one of the two bounded stores (stream cache,
//! recents).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::StreamCache;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::{
    Category, PlaylistLinks, RecentCategory, ResolvedStream, StreamMode, UrlDescriptor, VideoRef,
};
use crate::playlist::{PlaylistContent, PlaylistEntry, PlaylistKind, generator, xspf};
use crate::recents::RecentCategories;
use crate::upstream::{BuiltPage, ModelBuilder, PageFetcher, StreamResolver};

#[derive(Clone)]
pub struct GatewayService {
    fetcher: Arc<PageFetcher>,
    builder: Arc<ModelBuilder>,
    resolver: Arc<StreamResolver>,
    cache: Arc<StreamCache>,
    recents: Arc<RecentCategories>,
    default_mode: StreamMode,
}

impl GatewayService {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let fetcher = Arc::new(PageFetcher::new(&config.upstream)?);
        let builder = Arc::new(ModelBuilder::new(fetcher.clone(), &config.upstream));
        let resolver = Arc::new(StreamResolver::new(
            fetcher.clone(),
            config.upstream.api_url.clone(),
            &config.stream,
        ));
        Ok(Self {
            fetcher,
            builder,
            resolver,
            cache: Arc::new(StreamCache::new(config.stream.cache_capacity)),
            recents: Arc::new(RecentCategories::new(config.recents.capacity)),
            default_mode: config.stream.mode,
        })
    }

    pub fn default_stream_mode(&self) -> StreamMode {
        self.default_mode
    }

    fn video_url(base_url: &str, episode_id: &str) -> String {
        format!("{}/v/{}", base_url.trim_end_matches('/'), episode_id)
    }

    fn category_url(base_url: &str, category_id: &str) -> String {
        format!("{}/c/{}", base_url.trim_end_matches('/'), category_id)
    }

    /// `/p`: turn an arbitrary upstream URL into a JSON descriptor
    pub async fn describe_url(&self, base_url: &str, url: &str) -> AppResult<UrlDescriptor> {
        if !self.builder.is_upstream_url(url) {
            return Err(AppError::validation(format!(
                "'{url}' is not an upstream URL"
            )));
        }
        match self.builder.describe(url).await? {
            BuiltPage::Category(category) => {
                self.recents.record(&category).await;
                Ok(Self::category_descriptor(base_url, &category))
            }
            BuiltPage::Episode(episode) => Ok(UrlDescriptor::Single {
                url: Self::video_url(base_url, &episode.id),
                id: episode.id,
                title: episode.title,
                category: episode.category_id,
            }),
        }
    }

    fn category_descriptor(base_url: &str, category: &Category) -> UrlDescriptor {
        UrlDescriptor::Category {
            id: category.id.clone(),
            title: category.title.clone(),
            url: Self::category_url(base_url, &category.id),
            playlists: PlaylistLinks::for_category(base_url, &category.id),
            videos: category
                .episodes
                .iter()
                .map(|episode| VideoRef {
                    id: episode.id.clone(),
                    title: episode.title.clone(),
                    url: Self::video_url(base_url, &episode.id),
                })
                .collect(),
        }
    }

    /// `/c`: build one playlist rendition of a category
    pub async fn category_playlist(
        &self,
        base_url: &str,
        category_id: &str,
        kind: PlaylistKind,
    ) -> AppResult<PlaylistContent> {
        let category = self.builder.category(category_id).await?;
        self.recents.record(&category).await;

        let entries = if kind.is_direct() {
            self.direct_entries(&category).await
        } else {
            Self::external_entries(base_url, &category)
        };

        let content = match kind {
            PlaylistKind::M3u8 => generator::build_m3u8(&entries),
            PlaylistKind::Dpl | PlaylistKind::DplExt => generator::build_dpl(&entries),
            PlaylistKind::Xspf | PlaylistKind::XspfExt => {
                xspf::build_xspf(&category.title, &entries)
            }
        };

        Ok(PlaylistContent {
            content,
            content_type: kind.content_type(),
            file_name: format!("{}.{}", category.title, kind.file_extension()),
        })
    }

    fn external_entries(base_url: &str, category: &Category) -> Vec<PlaylistEntry> {
        category
            .episodes
            .iter()
            .map(|episode| PlaylistEntry {
                title: episode.title.clone(),
                url: Self::video_url(base_url, &episode.id),
            })
            .collect()
    }

    /// Direct renditions resolve every episode at generation time. An
    /// episode that fails to resolve is omitted and logged; it never aborts
    /// the playlist.
    async fn direct_entries(&self, category: &Category) -> Vec<PlaylistEntry> {
        let mut entries = Vec::with_capacity(category.episodes.len());
        for episode in &category.episodes {
            match self.resolve_episode(&episode.id).await {
                Ok(stream) => entries.push(PlaylistEntry {
                    title: episode.title.clone(),
                    url: stream.media_url,
                }),
                Err(e) => warn!(
                    "Omitting episode {} from direct playlist: {}",
                    episode.id, e
                ),
            }
        }
        entries
    }

    /// `/v`: resolved stream for one episode, via the bounded cache
    pub async fn resolve_episode(&self, post_id: &str) -> AppResult<ResolvedStream> {
        if let Some(hit) = self.cache.get(post_id).await {
            debug!("Stream cache hit for episode {}", post_id);
            return Ok(hit);
        }
        let (episode, payload) = self.builder.episode(post_id).await?;
        let stream = self.resolver.resolve(&episode.id, &payload).await?;
        self.cache.insert(stream.clone()).await;
        Ok(stream)
    }

    /// Open the upstream media for relaying, forwarding range headers
    pub async fn open_media(
        &self,
        stream: &ResolvedStream,
        range: Option<&str>,
        if_range: Option<&str>,
    ) -> AppResult<reqwest::Response> {
        Ok(self
            .fetcher
            .open_media(&stream.media_url, range, if_range)
            .await?)
    }

    /// `/l`: recently seen categories, most recent first
    pub async fn recent_categories(&self, base_url: &str, expanded: bool) -> Vec<RecentCategory> {
        self.recents
            .list()
            .await
            .into_iter()
            .map(|entry| RecentCategory {
                url: Self::category_url(base_url, &entry.id),
                playlists: expanded.then(|| PlaylistLinks::for_category(base_url, &entry.id)),
                id: entry.id,
                title: entry.title,
            })
            .collect()
    }
}
