use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::error::ConfigError;
use super::state::PhotoAuthorization;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub generation: GenerationConfig,
    pub toast: ToastConfig,
    pub body_check: BodyCheckConfig,
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Missing files fall back to defaults; unreadable or malformed files
    /// are errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.min_delay_ms > self.generation.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "generation.min_delay_ms ({}) exceeds generation.max_delay_ms ({})",
                self.generation.min_delay_ms, self.generation.max_delay_ms
            )));
        }
        if !self.body_check.min_aspect.is_finite() || self.body_check.min_aspect < 0.0 {
            return Err(ConfigError::Invalid(
                "body_check.min_aspect must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 2_000,
            max_delay_ms: 3_000,
        }
    }
}

impl GenerationConfig {
    pub fn delay_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ToastConfig {
    pub default_duration_ms: u64,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 2_000,
        }
    }
}

impl ToastConfig {
    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BodyCheckConfig {
    pub min_height: u32,
    pub min_aspect: f64,
}

impl Default for BodyCheckConfig {
    fn default() -> Self {
        Self {
            min_height: 900,
            min_aspect: 1.2,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub preferences_path: Option<PathBuf>,
    pub photo_library_dir: Option<PathBuf>,
    /// Authorization the simulated photo library starts in.
    pub photo_authorization: PhotoAuthorization,
    /// What a permission request resolves to when the state is not yet
    /// determined.
    pub photo_request_grants: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            preferences_path: None,
            photo_library_dir: None,
            photo_authorization: PhotoAuthorization::NotDetermined,
            photo_request_grants: true,
        }
    }
}
