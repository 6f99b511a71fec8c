use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `POLICY_EXPRESS__` and overridable from the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Optional JSON file mapping arm id to arm params. When unset the
    /// catalog store seeds a small demo catalog instead.
    #[serde(default)]
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Default `prefs.promo_ratio` written into freshly initialized states.
    #[serde(default = "default_promo_ratio")]
    pub default_promo_ratio: f64,
    /// Per-key snapshot history cap; the oldest snapshots past this are
    /// dropped, the latest is always retained.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_node_id() -> String {
    "policy-node-1".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_promo_ratio() -> f64 {
    0.35
}

fn default_max_history() -> usize {
    256
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            catalog: CatalogConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { seed_file: None }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_promo_ratio: default_promo_ratio(),
            max_history: default_max_history(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("POLICY_EXPRESS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.api.http_port, 8080);
        assert_eq!(config.metrics.port, 9090);
        assert!(config.metrics.enabled);
        assert!(config.catalog.seed_file.is_none());
        assert!((config.policy.default_promo_ratio - 0.35).abs() < f64::EPSILON);
        assert_eq!(config.policy.max_history, 256);
    }

    #[test]
    fn serde_defaults_match_default_impl() {
        let from_empty: AppConfig = serde_json::from_str("{}").unwrap();
        let explicit = AppConfig::default();
        assert_eq!(from_empty.node_id, explicit.node_id);
        assert_eq!(from_empty.api.http_port, explicit.api.http_port);
        assert_eq!(from_empty.policy.max_history, explicit.policy.max_history);
    }
}
