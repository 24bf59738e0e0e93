//! Playlist serialization
//!
//! Pure, stateless transforms from a resolved category to the supported
//! player formats. The five wire kinds split into *external* renditions
//! (entries point at this server's `/v/{id}` endpoints, so expiring upstream
//! URLs never leak into saved playlists) and *direct* renditions (entries
//! carry the pre-resolved upstream media URLs, saving the player one hop per
//! episode). m3u8 is always external.

use std::str::FromStr;

use crate::errors::AppError;

pub mod generator;
pub mod xspf;

/// Wire names accepted by the `?playlist=` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PlaylistKind {
    M3u8,
    Dpl,
    DplExt,
    Xspf,
    XspfExt,
}

impl PlaylistKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            PlaylistKind::M3u8 => "application/x-mpegURL",
            PlaylistKind::Dpl | PlaylistKind::DplExt => "text/plain; charset=utf-8",
            PlaylistKind::Xspf | PlaylistKind::XspfExt => "application/xspf+xml",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            PlaylistKind::M3u8 => "m3u8",
            PlaylistKind::Dpl | PlaylistKind::DplExt => "dpl",
            PlaylistKind::Xspf | PlaylistKind::XspfExt => "xspf",
        }
    }

    /// Direct renditions carry resolved upstream URLs and therefore resolve
    /// every episode at generation time
    pub fn is_direct(&self) -> bool {
        matches!(self, PlaylistKind::Dpl | PlaylistKind::Xspf)
    }

    /// Parse a client-supplied kind, mapping failures to a 400-class error
    pub fn parse(value: &str) -> Result<Self, AppError> {
        Self::from_str(value.trim())
            .map_err(|_| AppError::validation(format!("unknown playlist type '{value}'")))
    }
}

/// One serialized playlist ready to be served
#[derive(Debug, Clone)]
pub struct PlaylistContent {
    pub content: String,
    pub content_type: &'static str,
    pub file_name: String,
}

/// One (title, location) pair fed to the serializers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub title: String,
    pub url: String,
}

/// Collapse newlines out of a title so it cannot break a line-based format
pub(crate) fn sanitize_title(title: &str) -> String {
    title.replace(['\r', '\n'], " ")
}
