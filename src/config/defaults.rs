//! Default configuration values

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8520;

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://anime1.me";
pub const DEFAULT_UPSTREAM_API_URL: &str = "https://v.anime1.me/api";

pub const DEFAULT_MAX_CONNECTIONS: usize = 8;

/// Realistic browser identities rotated per outbound page request
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

pub const DEFAULT_RECENTS_CAPACITY: usize = 32;
pub const DEFAULT_STREAM_CACHE_CAPACITY: usize = 128;
