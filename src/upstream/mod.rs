//! Upstream resolution pipeline
//!
//! Everything that talks to or interprets the upstream site lives here:
//! fetching pages ([`fetcher`]), turning HTML into skeleton models
//! ([`extractor`]), recovering playable URLs from the obfuscated embedded
//! payload ([`resolver`]) and assembling canonical [`crate::models`] entities
//! ([`builder`]).

pub mod builder;
pub mod extractor;
pub mod fetcher;
pub mod resolver;

pub use builder::{BuiltPage, ModelBuilder};
pub use fetcher::PageFetcher;
pub use resolver::{EmbeddedPayload, StreamResolver};
