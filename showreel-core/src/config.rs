//! Centralized configuration for Showreel.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// Central configuration for all Showreel components.
///
/// Passed explicitly to the components that need it; nothing reads
/// configuration from global state after startup.
#[derive(Debug, Clone, Default)]
pub struct ShowreelConfig {
    pub server: ServerConfig,
    pub media: MediaConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind to
    pub host: String,
    /// TCP port to bind to
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address described by `host` and `port`.
    ///
    /// `host` may be an IPv4 or IPv6 literal (brackets optional) or
    /// `localhost`.
    ///
    /// # Errors
    ///
    /// - `std::net::AddrParseError` - If `host` is not an IP address
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let host = self.host.trim();
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        let ip = if host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            host.parse::<IpAddr>()?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// How out-of-bounds byte ranges are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    /// Reject any range outside `0..length` with 416.
    #[default]
    Strict,
    /// Clamp an `end` past the resource to its last byte. A `start` past
    /// the resource or after `end` is still rejected.
    Clamp,
}

impl FromStr for RangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(RangePolicy::Strict),
            "clamp" => Ok(RangePolicy::Clamp),
            _ => Err(format!("Invalid range policy: {s}")),
        }
    }
}

/// Media library and streaming configuration.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory holding uploaded videos; ids resolve relative to it
    pub root: PathBuf,
    /// Content type sent with every media response
    pub content_type: String,
    /// Maximum size of a single body chunk read from storage
    pub chunk_size: usize,
    /// Treatment of ranges that fall outside the resource
    pub range_policy: RangePolicy,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("uploads/videos"),
            content_type: "video/mp4".to_string(),
            chunk_size: 64 * 1024, // 64 KiB
            range_policy: RangePolicy::Strict,
        }
    }
}

impl ShowreelConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Used by `from_env` and by tests that must not touch process state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = lookup("SHOWREEL_HOST") {
            config.server.host = host;
        }

        if let Some(port) = lookup("SHOWREEL_PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            config.server.port = port;
        }

        if let Some(root) = lookup("SHOWREEL_MEDIA_ROOT") {
            config.media.root = PathBuf::from(root);
        }

        if let Some(content_type) = lookup("SHOWREEL_CONTENT_TYPE")
            && !content_type.is_empty()
        {
            config.media.content_type = content_type;
        }

        if let Some(chunk_size) = lookup("SHOWREEL_CHUNK_SIZE")
            && let Ok(size) = chunk_size.parse::<usize>()
            && size > 0
        {
            config.media.chunk_size = size;
        }

        if let Some(policy) = lookup("SHOWREEL_RANGE_POLICY")
            && let Ok(policy) = policy.parse::<RangePolicy>()
        {
            config.media.range_policy = policy;
        }

        config
    }

    /// Creates a configuration optimized for testing.
    ///
    /// Small chunks make multi-chunk streaming paths reachable with tiny
    /// fixtures.
    pub fn for_testing(media_root: PathBuf) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            media: MediaConfig {
                root: media_root,
                chunk_size: 64,
                ..Default::default()
            },
        }
    }
}
