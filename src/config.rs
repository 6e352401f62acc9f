//! Submap configuration loaded from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config: {source}")]
    Parse { source: toml::de::Error },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which voxels are relevant for registration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationFilterConfig {
    /// Voxels need a weight strictly above this
    pub min_voxel_weight: f32,
    /// Voxels need an absolute distance strictly below this (truncation band)
    pub max_voxel_distance: f32,
    /// Take the registration distance from the ESDF instead of the TSDF
    pub use_esdf_distance: bool,
}

impl Default for RegistrationFilterConfig {
    fn default() -> Self {
        Self {
            min_voxel_weight: 1e-6,
            max_voxel_distance: 0.6,
            use_esdf_distance: true,
        }
    }
}

/// ESDF generation limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EsdfConfig {
    /// Propagation stops at this distance
    pub max_distance: f32,
    /// TSDF voxels at or below this weight count as unobserved
    pub min_weight: f32,
    /// Observed TSDF voxels closer to the surface than this seed the ESDF
    pub fixed_band_distance: f32,
}

impl Default for EsdfConfig {
    fn default() -> Self {
        Self {
            max_distance: 2.0,
            min_weight: 1e-6,
            fixed_band_distance: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubmapConfig {
    /// Voxel edge length in meters
    pub voxel_size: f32,
    pub voxels_per_side: usize,
    pub registration_filter: RegistrationFilterConfig,
    pub esdf: EsdfConfig,
}

impl Default for SubmapConfig {
    fn default() -> Self {
        Self {
            voxel_size: 0.1,
            voxels_per_side: 16,
            registration_filter: RegistrationFilterConfig::default(),
            esdf: EsdfConfig::default(),
        }
    }
}

impl SubmapConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SubmapConfig =
            toml::from_str(content).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.voxel_size.is_finite() && self.voxel_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "voxel_size must be positive, got {}",
                self.voxel_size
            )));
        }
        if self.voxels_per_side == 0 {
            return Err(ConfigError::Invalid("voxels_per_side must be at least 1".to_string()));
        }

        let filter = &self.registration_filter;
        if filter.min_voxel_weight < 0.0 || filter.max_voxel_distance < 0.0 {
            return Err(ConfigError::Invalid(
                "registration_filter thresholds must be non-negative".to_string(),
            ));
        }
        if self.esdf.max_distance <= 0.0 || self.esdf.fixed_band_distance < 0.0 {
            return Err(ConfigError::Invalid(
                "esdf.max_distance must be positive and esdf.fixed_band_distance non-negative"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SubmapConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.registration_filter.max_voxel_distance - 0.6).abs() < 1e-6);
        assert!(config.registration_filter.use_esdf_distance);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SubmapConfig::from_toml_str(
            r#"
            voxel_size = 0.05

            [registration_filter]
            max_voxel_distance = 0.3
            use_esdf_distance = false
            "#,
        )
        .unwrap();

        assert!((config.voxel_size - 0.05).abs() < 1e-6);
        assert_eq!(config.voxels_per_side, 16);
        assert!((config.registration_filter.max_voxel_distance - 0.3).abs() < 1e-6);
        assert!(!config.registration_filter.use_esdf_distance);
        assert_eq!(config.esdf, EsdfConfig::default());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = SubmapConfig::from_toml_str("voxel_sise = 0.2");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = SubmapConfig::from_toml_str("voxels_per_side = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = SubmapConfig::from_toml_str("voxel_size = -1.0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("rustsubmap-config-{}.toml", std::process::id()));
        fs::write(&path, "[esdf]\nmax_distance = 4.0\n").unwrap();

        let config = SubmapConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert!((config.esdf.max_distance - 4.0).abs() < 1e-6);

        let missing = SubmapConfig::load(Path::new("/nonexistent/rustsubmap.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
