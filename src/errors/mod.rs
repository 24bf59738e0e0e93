//! Error types for the anime1-proxy application
//!
//! Each layer of the resolution pipeline has its own error enum so that a
//! caller can tell apart "the network failed" from "the upstream markup
//! changed" from "the obfuscation scheme changed". The top-level [`AppError`]
//! is what the web layer maps onto HTTP status codes.

pub mod types;

pub use types::{AppError, FetchError, ParseError, ResolveError};

/// Convenience result type used throughout the application
pub type AppResult<T> = Result<T, AppError>;
