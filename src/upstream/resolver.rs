//! Embedded payload decoding and stream resolution
//!
//! The upstream hides the real media location behind an encoded blob inside
//! each episode page. The encoding is upstream-controlled and changes
//! without notice, so everything scheme-specific is isolated in
//! [`decode_payload`]: when the upstream rotates its obfuscation, that one
//! function is the only place to touch. Parsing is defensive throughout;
//! nothing beyond what is verified is assumed about the structure.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::config::StreamConfig;
use crate::errors::ResolveError;
use crate::models::ResolvedStream;
use crate::upstream::fetcher::PageFetcher;

/// Raw obfuscated blob lifted from a page by the extractor.
///
/// Parse-only and transient: it never leaves the resolver, and resolving it
/// is a pure function of its contents (modulo upstream-side token expiry).
#[derive(Debug, Clone)]
pub struct EmbeddedPayload {
    raw: String,
}

impl EmbeddedPayload {
    pub(crate) fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }
}

/// One (quality label, source) pair from a decoded payload or a resolution
/// response
#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    src: String,
    #[serde(rename = "type")]
    content_type: Option<String>,
    #[serde(default)]
    resolution: Option<String>,
}

/// Payload after the reversible transform has been undone
#[derive(Debug)]
struct DecodedPayload {
    /// The decoded attribute set as text, posted verbatim to the resolution
    /// endpoint when a second round trip is needed
    token: String,
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "s")]
    sources: Vec<Candidate>,
}

/// Undo the upstream's reversible encoding and read out the attribute set.
///
/// Known schemes, tried in order: percent-encoded JSON object (current), and
/// base64-wrapped JSON object (older pages). Anything else is
/// [`ResolveError::DecodeFailed`], the signal that the scheme has rotated
/// again.
fn decode_payload(payload: &EmbeddedPayload) -> Result<DecodedPayload, ResolveError> {
    let token = urlencoding::decode(payload.as_str())
        .map_err(|e| ResolveError::DecodeFailed {
            reason: format!("payload is not percent-encoded UTF-8: {e}"),
        })?
        .into_owned();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&token) {
        return interpret(token, value);
    }

    if let Ok(bytes) = BASE64.decode(token.trim())
        && let Ok(text) = String::from_utf8(bytes)
        && let Ok(value) = serde_json::from_str::<serde_json::Value>(&text)
    {
        return interpret(text, value);
    }

    Err(ResolveError::DecodeFailed {
        reason: "unrecognized payload encoding".to_string(),
    })
}

fn interpret(token: String, value: serde_json::Value) -> Result<DecodedPayload, ResolveError> {
    if !value.is_object() {
        return Err(ResolveError::DecodeFailed {
            reason: "decoded payload is not an attribute set".to_string(),
        });
    }

    // "s" doubles as a signature string in pointer payloads; only an array
    // is a source list.
    let candidates = match value.get("s") {
        Some(sources @ serde_json::Value::Array(_)) => {
            serde_json::from_value::<Vec<Candidate>>(sources.clone()).map_err(|e| {
                ResolveError::DecodeFailed {
                    reason: format!("malformed source list in payload: {e}"),
                }
            })?
        }
        _ => Vec::new(),
    };

    Ok(DecodedPayload { token, candidates })
}

/// Fixed quality preference: the largest labelled resolution wins, an
/// unlabelled candidate scores zero, and ties keep the first occurrence.
fn select_candidate(candidates: &[Candidate]) -> Option<&Candidate> {
    let mut best: Option<(&Candidate, u32)> = None;
    for candidate in candidates {
        let score = resolution_score(candidate);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, _)| candidate)
}

fn resolution_score(candidate: &Candidate) -> u32 {
    candidate
        .resolution
        .as_deref()
        .map(|label| {
            label
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// Normalize a source into an absolute URL, if it already is one.
/// Scheme-relative sources inherit https; anything else needs a round trip.
fn absolutize(src: &str) -> Option<String> {
    if src.starts_with("//") {
        Some(format!("https:{src}"))
    } else if src.starts_with("http://") || src.starts_with("https://") {
        Some(src.to_string())
    } else {
        None
    }
}

pub struct StreamResolver {
    fetcher: Arc<PageFetcher>,
    api_url: String,
    expire_offset: chrono::Duration,
    default_ttl: chrono::Duration,
}

impl StreamResolver {
    pub fn new(fetcher: Arc<PageFetcher>, api_url: impl Into<String>, stream: &StreamConfig) -> Self {
        Self {
            fetcher,
            api_url: api_url.into(),
            expire_offset: chrono::Duration::from_std(stream.expire_offset_duration())
                .unwrap_or_else(|_| chrono::Duration::seconds(5)),
            default_ttl: chrono::Duration::from_std(stream.default_ttl_duration())
                .unwrap_or_else(|_| chrono::Duration::seconds(60)),
        }
    }

    /// Turn one embedded payload into the final playable URL.
    ///
    /// No retries here: a stale token cannot be fixed by asking again, only
    /// by re-fetching the page it came from.
    pub async fn resolve(
        &self,
        episode_id: &str,
        payload: &EmbeddedPayload,
    ) -> Result<ResolvedStream, ResolveError> {
        let decoded = decode_payload(payload)?;

        // Some payload versions name playable URLs directly.
        if let Some(best) = select_candidate(&decoded.candidates)
            && let Some(url) = absolutize(&best.src)
        {
            debug!("Payload for episode {} carried a direct source", episode_id);
            return Ok(self.finish(episode_id, url, best.content_type.clone(), None));
        }

        // Otherwise the decoded set is only a pointer: trade it for the final
        // URL at the resolution endpoint.
        let (body, cookies) = self
            .fetcher
            .post_form(&self.api_url, &[("d", &decoded.token)])
            .await
            .map_err(|e| ResolveError::UpstreamRejected {
                message: e.to_string(),
            })?;

        let response: ApiResponse =
            serde_json::from_str(&body).map_err(|e| ResolveError::UpstreamRejected {
                message: format!("unexpected resolution response: {e}"),
            })?;

        let best = select_candidate(&response.sources).ok_or(ResolveError::NoCandidates)?;
        let url = absolutize(&best.src).ok_or_else(|| ResolveError::UpstreamRejected {
            message: format!("resolution endpoint returned a non-absolute source: {}", best.src),
        })?;

        let expiry_epoch = cookies
            .iter()
            .find(|(name, _)| name == "e")
            .and_then(|(_, value)| value.parse::<i64>().ok());

        debug!(
            "Resolved episode {} to {} (expiry cookie: {:?})",
            episode_id, url, expiry_epoch
        );
        Ok(self.finish(episode_id, url, best.content_type.clone(), expiry_epoch))
    }

    fn finish(
        &self,
        episode_id: &str,
        media_url: String,
        content_type: Option<String>,
        expiry_epoch: Option<i64>,
    ) -> ResolvedStream {
        let now = Utc::now();
        let expires_at = expiry_epoch
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|instant| instant - self.expire_offset)
            .unwrap_or(now + self.default_ttl);

        ResolvedStream {
            episode_id: episode_id.to_string(),
            media_url,
            content_type: content_type.unwrap_or_else(|| "video/mp4".to_string()),
            resolved_at: now,
            expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(raw: &str) -> EmbeddedPayload {
        EmbeddedPayload::new(raw)
    }

    #[test]
    fn percent_encoded_token_decodes_to_itself() {
        // {"c":"596","e":"14","t":1700000000,"p":0,"s":"sig"}
        let raw = "%7B%22c%22%3A%22596%22%2C%22e%22%3A%2214%22%2C%22t%22%3A1700000000%2C%22p%22%3A0%2C%22s%22%3A%22sig%22%7D";
        let decoded = decode_payload(&payload(raw)).unwrap();
        assert_eq!(
            decoded.token,
            r#"{"c":"596","e":"14","t":1700000000,"p":0,"s":"sig"}"#
        );
        // "s" is a signature string here, not a source list; the payload is
        // only a pointer.
        assert!(decoded.candidates.is_empty());
    }

    #[test]
    fn base64_wrapped_payload_decodes() {
        let json = r#"{"c":"596","e":"14"}"#;
        let raw = BASE64.encode(json);
        let decoded = decode_payload(&payload(&raw)).unwrap();
        assert_eq!(decoded.token, json);
    }

    #[test]
    fn direct_candidates_are_recognized() {
        let json = r#"{"s":[{"src":"//cdn.example.net/ep1-720.mp4","type":"video/mp4","resolution":"720p"},{"src":"//cdn.example.net/ep1-1080.mp4","type":"video/mp4","resolution":"1080p"}]}"#;
        let raw = urlencoding::encode(json).into_owned();
        let decoded = decode_payload(&payload(&raw)).unwrap();
        let best = select_candidate(&decoded.candidates).unwrap();
        assert_eq!(best.src, "//cdn.example.net/ep1-1080.mp4");
        assert_eq!(
            absolutize(&best.src).unwrap(),
            "https://cdn.example.net/ep1-1080.mp4"
        );
    }

    #[test]
    fn ties_and_unlabelled_candidates_keep_first_occurrence() {
        let candidates = vec![
            Candidate {
                src: "first".to_string(),
                content_type: None,
                resolution: None,
            },
            Candidate {
                src: "second".to_string(),
                content_type: None,
                resolution: None,
            },
        ];
        assert_eq!(select_candidate(&candidates).unwrap().src, "first");
    }

    #[test]
    fn garbage_payload_is_a_decode_failure() {
        let err = decode_payload(&payload("!!not-anything-we-know!!")).unwrap_err();
        assert!(matches!(err, ResolveError::DecodeFailed { .. }));
    }

    #[test]
    fn non_object_payload_is_a_decode_failure() {
        let raw = urlencoding::encode(r#"[1,2,3]"#).into_owned();
        let err = decode_payload(&payload(&raw)).unwrap_err();
        assert!(matches!(err, ResolveError::DecodeFailed { .. }));
    }

    #[test]
    fn decoding_is_idempotent() {
        let raw = "%7B%22c%22%3A%2290%22%7D";
        let first = decode_payload(&payload(raw)).unwrap();
        let second = decode_payload(&payload(raw)).unwrap();
        assert_eq!(first.token, second.token);
    }

    #[test]
    fn relative_sources_are_not_absolute() {
        assert_eq!(absolutize("streams/ep1.mp4"), None);
        assert_eq!(
            absolutize("https://cdn.example.net/ep1.mp4").as_deref(),
            Some("https://cdn.example.net/ep1.mp4")
        );
    }
}
