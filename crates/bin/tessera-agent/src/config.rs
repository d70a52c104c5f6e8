//! agent config file (toml)

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tessera::{NonceConfig, ShamirConfig, SinkConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub shamir: ShamirConfig,
    pub sink: SinkConfig,
    pub nonce: NonceConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// tracing filter used when RUST_LOG is unset
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "tessera=info,tessera_agent=info".into(),
        }
    }
}

impl AgentConfig {
    /// load `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_missing_path_gives_defaults() {
        let cfg = AgentConfig::load(None).unwrap();
        assert_eq!(cfg.shamir.parts, 5);
        assert_eq!(cfg.shamir.threshold, 3);
        assert_eq!(cfg.log.filter, "tessera=info,tessera_agent=info");
    }

    #[test]
    fn test_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        std::fs::write(
            &path,
            "[sink]\npath = \"/run/token\"\nmode = 0o600\n[nonce]\nttl_secs = 30\n[log]\nfilter = \"debug\"\n",
        )
        .unwrap();

        let cfg = AgentConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(cfg.sink.mode, 0o600);
        assert_eq!(cfg.nonce.ttl, Duration::from_secs(30));
        assert_eq!(cfg.log.filter, "debug");
        assert_eq!(cfg.shamir.parts, 5);
    }

    #[test]
    fn test_unreadable_file_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(AgentConfig::load(Some(missing.as_path())).is_err());
    }
}
