use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::gate::HostKey;

/// Default number of concurrent downloads per host
pub const DEFAULT_PER_HOST: usize = 4;

/// Per-host configuration overrides
pub type HostConfigs = HashMap<HostKey, HostConfig>;

/// Configuration for a specific host's admission behavior
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Maximum concurrent downloads allowed from this host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
}

impl HostConfig {
    /// Get the effective maximum concurrency, falling back to the default
    /// limit of the gate
    #[must_use]
    pub fn effective_concurrency(&self, default_limit: usize) -> usize {
        self.concurrency.unwrap_or(default_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_config_effective_values() {
        assert_eq!(HostConfig::default().effective_concurrency(3), 3);

        let host_config = HostConfig {
            concurrency: Some(1),
        };
        assert_eq!(host_config.effective_concurrency(3), 1);
    }

    #[test]
    fn test_host_configs_from_toml() {
        let configs: HostConfigs = toml::from_str(
            r#"
            "Example.COM" = { concurrency = 2 }
            "docs.rs" = {}
            "#,
        )
        .unwrap();

        assert_eq!(
            configs.get(&HostKey::from("example.com")),
            Some(&HostConfig {
                concurrency: Some(2)
            })
        );
        assert_eq!(
            configs.get(&HostKey::from("docs.rs")),
            Some(&HostConfig::default())
        );
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let parsed: Result<HostConfig, _> = toml::from_str("request_interval = \"1s\"");
        assert!(parsed.is_err());
    }
}
