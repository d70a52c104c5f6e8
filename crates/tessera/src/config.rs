//! construction-time knobs for the three primitives
//!
//! every struct deserializes with serde defaults so a host can embed them
//! in its own config file and omit anything it does not care about.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// nonce validity window
pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(15 * 60);

/// permissions applied to a published token
pub const DEFAULT_SINK_MODE: u32 = 0o640;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShamirConfig {
    pub parts: u8,
    pub threshold: u8,
}

impl Default for ShamirConfig {
    fn default() -> Self {
        Self {
            parts: 5,
            threshold: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub path: PathBuf,
    /// unix permission bits, e.g. `0o640`; `0` means the default
    pub mode: u32,
}

impl SinkConfig {
    pub fn new(path: impl Into<PathBuf>, mode: u32) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    /// configured mode, with `0` mapped to [`DEFAULT_SINK_MODE`]
    pub fn effective_mode(&self) -> u32 {
        if self.mode == 0 {
            DEFAULT_SINK_MODE
        } else {
            self.mode
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("token"),
            mode: DEFAULT_SINK_MODE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NonceConfig {
    #[serde(rename = "ttl_secs", deserialize_with = "duration_from_secs")]
    pub ttl: Duration,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_NONCE_TTL,
        }
    }
}

fn duration_from_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    if secs == 0 {
        return Err(serde::de::Error::custom("ttl_secs must be positive"));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Host {
        #[serde(default)]
        shamir: ShamirConfig,
        #[serde(default)]
        sink: SinkConfig,
        #[serde(default)]
        nonce: NonceConfig,
    }

    #[test]
    fn test_defaults_from_empty_document() {
        let host: Host = toml::from_str("").unwrap();
        assert_eq!(host.shamir, ShamirConfig::default());
        assert_eq!(host.sink.effective_mode(), 0o640);
        assert_eq!(host.nonce.ttl, Duration::from_secs(900));
    }

    #[test]
    fn test_overrides() {
        let host: Host = toml::from_str(
            r#"
            [shamir]
            parts = 7
            [sink]
            path = "/run/agent/token"
            mode = 0o600
            [nonce]
            ttl_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(host.shamir.parts, 7);
        assert_eq!(host.shamir.threshold, 3);
        assert_eq!(host.sink.path, PathBuf::from("/run/agent/token"));
        assert_eq!(host.sink.mode, 0o600);
        assert_eq!(host.nonce.ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let res: std::result::Result<Host, _> = toml::from_str("[nonce]\nttl_secs = 0\n");
        assert!(res.is_err());
    }

    #[test]
    fn test_zero_mode_means_default() {
        assert_eq!(SinkConfig::new("x", 0).effective_mode(), DEFAULT_SINK_MODE);
    }
}
