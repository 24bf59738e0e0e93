//! Outbound HTTP access to the upstream site
//!
//! A single [`PageFetcher`] is shared by all requests. It owns two reqwest
//! clients over one cookie jar: a page client with a total request timeout,
//! and a media client with a connect timeout only (media relays must stay
//! open for as long as the player keeps reading). The cookie jar is shared
//! because the resolution endpoint sets access cookies the media host
//! expects to see again.
//!
//! No retries at this layer; callers decide whether a failed fetch is worth
//! re-issuing.

use std::sync::Arc;

use rand::Rng;
use reqwest::cookie::Jar;
use reqwest::{Client, header};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::errors::FetchError;

pub struct PageFetcher {
    page_client: Client,
    media_client: Client,
    limiter: Semaphore,
    base_url: String,
    user_agents: Vec<String>,
}

impl PageFetcher {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let jar = Arc::new(Jar::default());

        let page_client = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(config.request_timeout_duration())
            .connect_timeout(config.connect_timeout_duration())
            .pool_max_idle_per_host(config.max_connections)
            .build()?;

        // No total timeout: a proxied episode stays open for the whole playback.
        let media_client = Client::builder()
            .cookie_provider(jar)
            .connect_timeout(config.connect_timeout_duration())
            .pool_max_idle_per_host(config.max_connections)
            .build()?;

        Ok(Self {
            page_client,
            media_client,
            limiter: Semaphore::new(config.max_connections.max(1)),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agents: config.user_agents.clone(),
        })
    }

    fn pick_user_agent(&self) -> &str {
        if self.user_agents.is_empty() {
            return concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
        }
        let index = rand::rng().random_range(0..self.user_agents.len());
        &self.user_agents[index]
    }

    fn referer(&self) -> String {
        format!("{}/", self.base_url)
    }

    fn page_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("zh-TW,zh;q=0.9,en;q=0.8"),
        );
        headers.insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("max-age=0"),
        );
        insert_str(&mut headers, header::REFERER, &self.referer());
        insert_str(&mut headers, header::USER_AGENT, self.pick_user_agent());
        headers
    }

    async fn acquire(&self) -> Result<tokio::sync::SemaphorePermit<'_>, FetchError> {
        self.limiter
            .acquire()
            .await
            .map_err(|_| FetchError::Network {
                url: self.base_url.clone(),
                message: "connection limiter closed".to_string(),
            })
    }

    /// Fetch one upstream page and return its body.
    ///
    /// The caller is responsible for having validated that `url` belongs to
    /// the upstream host.
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let _permit = self.acquire().await?;
        debug!("Fetching upstream page: {}", url);

        let response = self
            .page_client
            .get(url)
            .headers(self.page_headers())
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| classify(url, e))
    }

    /// POST a form to an upstream endpoint, returning the body and the
    /// response cookies (the resolution endpoint carries its expiry there).
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<(String, Vec<(String, String)>), FetchError> {
        let _permit = self.acquire().await?;
        debug!("Posting upstream form: {}", url);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("zh-TW,zh;q=0.9,en;q=0.8"),
        );
        insert_str(&mut headers, header::ORIGIN, &self.base_url);
        insert_str(&mut headers, header::REFERER, &self.referer());
        insert_str(&mut headers, header::USER_AGENT, self.pick_user_agent());

        let response = self
            .page_client
            .post(url)
            .headers(headers)
            .form(fields)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let cookies = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        let body = response.text().await.map_err(|e| classify(url, e))?;
        Ok((body, cookies))
    }

    /// Open a resolved media URL, forwarding range/conditional headers.
    ///
    /// Returns the raw response so the proxy layer can relay status, headers
    /// and body. Dropping the response closes the upstream connection.
    pub async fn open_media(
        &self,
        url: &str,
        range: Option<&str>,
        if_range: Option<&str>,
    ) -> Result<reqwest::Response, FetchError> {
        debug!("Opening upstream media: {}", url);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));
        headers.insert(
            header::ACCEPT_ENCODING,
            header::HeaderValue::from_static("identity;q=1, *;q=0"),
        );
        insert_str(&mut headers, header::REFERER, &self.referer());
        insert_str(&mut headers, header::USER_AGENT, self.pick_user_agent());
        if let Some(range) = range {
            insert_str(&mut headers, header::RANGE, range);
        }
        if let Some(if_range) = if_range {
            insert_str(&mut headers, header::IF_RANGE, if_range);
        }

        let response = self
            .media_client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

fn insert_str(headers: &mut header::HeaderMap, name: header::HeaderName, value: &str) {
    if let Ok(v) = header::HeaderValue::from_str(value) {
        headers.insert(name, v);
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;

    #[test]
    fn fetcher_builds_from_default_config() {
        let fetcher = PageFetcher::new(&UpstreamConfig::default()).unwrap();
        assert_eq!(fetcher.referer(), "https://anime1.me/");
    }

    #[test]
    fn user_agent_comes_from_the_configured_pool() {
        let config = UpstreamConfig {
            user_agents: vec!["test-agent/1.0".to_string()],
            ..UpstreamConfig::default()
        };
        let fetcher = PageFetcher::new(&config).unwrap();
        assert_eq!(fetcher.pick_user_agent(), "test-agent/1.0");
    }

    #[test]
    fn empty_pool_falls_back_to_package_identity() {
        let config = UpstreamConfig {
            user_agents: vec![],
            ..UpstreamConfig::default()
        };
        let fetcher = PageFetcher::new(&config).unwrap();
        assert!(fetcher.pick_user_agent().starts_with("anime1-proxy/"));
    }
}
