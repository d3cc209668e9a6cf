use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::services::coefficients::CoefficientSet;

fn default_simulation_seed() -> u64 { 42 }
fn default_fetch_timeout_secs() -> u64 { 12 }
fn default_cache_ttl_secs() -> u64 { 3600 }
fn default_coefficients() -> String { CoefficientSet::DEFAULT_NAME.to_string() }
fn default_pv_system_loss_percent() -> f64 { 14.0 }
fn default_geoadmin_base() -> String { "https://api3.geo.admin.ch/rest/services/api/MapServer".to_string() }
fn default_pvgis_base() -> String { "https://re.jrc.ec.europa.eu/api/v5_2".to_string() }

/// Which set of collaborators backs the orchestrator.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Live,
    /// Deterministic collaborators seeded from `simulation_seed`.
    Simulation,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_simulation_seed")]
    pub simulation_seed: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_coefficients")]
    pub coefficients: String,
    #[serde(default = "default_pv_system_loss_percent")]
    pub pv_system_loss_percent: f64,
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    #[serde(default = "default_geoadmin_base")]
    pub geoadmin_base: String,
    #[serde(default = "default_pvgis_base")]
    pub pvgis_base: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            geoadmin_base: default_geoadmin_base(),
            pvgis_base: default_pvgis_base(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            simulation_seed: default_simulation_seed(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            coefficients: default_coefficients(),
            pv_system_loss_percent: default_pv_system_loss_percent(),
            endpoints: EndpointConfig::default(),
        }
    }
}

impl Config {
    /// Load from a JSON file. A missing file falls back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        // Reject unknown coefficient names up front rather than per request.
        config.coefficient_set()?;
        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn coefficient_set(&self) -> Result<&'static CoefficientSet, ConfigError> {
        CoefficientSet::by_name(&self.coefficients)
            .ok_or_else(|| ConfigError::UnknownCoefficients(self.coefficients.clone()))
    }
}
