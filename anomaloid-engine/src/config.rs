// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Simulation configuration
//!
//! Settings load from and save to TOML files. Every field has a default, so
//! a file only needs to name the values it changes:
//!
//! ```toml
//! seed = 7
//!
//! [spawn]
//! count = 60
//! mass_rate = 2.0
//!
//! [collision]
//! refresh_bounds = false
//! ```

use crate::error::ConfigError;
use crate::geometry::{BoundingBox, Vec2};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration loaded from and saved to files
pub trait Config: Serialize + DeserializeOwned + Default {
    /// Check that values are in range
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Parse and validate configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !is_toml(path) {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Save configuration to file
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if !is_toml(path) {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }
        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "toml")
}

/// How the initial population is generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Number of anomaloids spawned by `populate`
    pub count: usize,
    /// Rate λ of the exponential mass distribution
    pub mass_rate: f64,
    /// Factor applied to each exponential sample
    pub mass_scale: f64,
    /// Truncate sampled masses to whole units
    pub whole_unit_masses: bool,
    /// Radius per unit of mass
    pub radius_scale: f64,
    /// Bounds of the uniform `AnomalyMult` draw
    pub anomaly_range: (f64, f64),
    /// Rectangle positions are drawn from
    pub region: BoundingBox,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        SpawnConfig {
            count: 40,
            mass_rate: 1.5,
            mass_scale: 8.0,
            whole_unit_masses: true,
            radius_scale: 5.0,
            anomaly_range: (1.0, 10.0),
            region: BoundingBox::new(Vec2::new(-800.0, -500.0), Vec2::new(800.0, 500.0)),
        }
    }
}

impl SpawnConfig {
    /// Check that every value is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mass_rate.is_finite() && self.mass_rate > 0.0) {
            return Err(invalid(format!("spawn.mass_rate must be positive, got {}", self.mass_rate)));
        }
        if !(self.mass_scale.is_finite() && self.mass_scale >= 0.0) {
            return Err(invalid(format!(
                "spawn.mass_scale must be non-negative, got {}",
                self.mass_scale
            )));
        }
        if !(self.radius_scale.is_finite() && self.radius_scale >= 0.0) {
            return Err(invalid(format!(
                "spawn.radius_scale must be non-negative, got {}",
                self.radius_scale
            )));
        }
        let (low, high) = self.anomaly_range;
        if !(low.is_finite() && high.is_finite() && low <= high) {
            return Err(invalid(format!("spawn.anomaly_range [{}, {}] is inverted", low, high)));
        }
        let region = &self.region;
        let bounded = region.top().is_finite() && region.bot().is_finite() && region.size().is_finite();
        if !(bounded && region.has_area()) {
            return Err(invalid(format!(
                "spawn.region from {:?} to {:?} is empty or unbounded",
                region.top(),
                region.bot()
            )));
        }
        Ok(())
    }
}

/// Collision pipeline switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Recompute bounding boxes from positions before each detection pass
    pub refresh_bounds: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        CollisionConfig { refresh_bounds: true }
    }
}

/// Top-level simulation settings
///
/// # Examples
///
/// ```
/// use anomaloid_engine::config::{Config, SimulationConfig};
///
/// let config = SimulationConfig::from_toml_str("seed = 3\n[spawn]\ncount = 5\n").unwrap();
/// assert_eq!(config.spawn.count, 5);
/// assert_eq!(config.seed, Some(3));
/// assert!(config.collision.refresh_bounds);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the random source; `None` seeds from entropy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Initial population
    pub spawn: SpawnConfig,
    /// Collision pipeline
    pub collision: CollisionConfig,
}

impl SimulationConfig {
    /// Set the number of anomaloids to spawn
    pub fn with_count(mut self, count: usize) -> Self {
        self.spawn.count = count;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the spawn rectangle
    pub fn with_region(mut self, region: BoundingBox) -> Self {
        self.spawn.region = region;
        self
    }

    /// Set the exponential mass rate
    pub fn with_mass_rate(mut self, rate: f64) -> Self {
        self.spawn.mass_rate = rate;
        self
    }

    /// Enable or disable the bounding-box refresh pass
    pub fn with_refresh_bounds(mut self, refresh: bool) -> Self {
        self.collision.refresh_bounds = refresh;
        self
    }
}

impl Config for SimulationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.spawn.validate()
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.spawn.count, 40);
        assert_eq!(config.spawn.mass_rate, 1.5);
        assert_eq!(config.spawn.radius_scale, 5.0);
        assert_eq!(config.spawn.anomaly_range, (1.0, 10.0));
        assert_eq!(config.spawn.region.top(), Vec2::new(-800.0, -500.0));
        assert!(config.collision.refresh_bounds);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            "[spawn]\nmass_rate = 2.0\nanomaly_range = [2.0, 3.0]\n[collision]\nrefresh_bounds = false\n",
        )
        .unwrap();
        assert_eq!(config.spawn.mass_rate, 2.0);
        assert_eq!(config.spawn.anomaly_range, (2.0, 3.0));
        assert_eq!(config.spawn.count, 40);
        assert!(!config.collision.refresh_bounds);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_region_from_toml() {
        let config = SimulationConfig::from_toml_str(
            "[spawn.region]\ntop = { x = 0.0, y = 0.0 }\nbot = { x = 10.0, y = 20.0 }\n",
        )
        .unwrap();
        assert_eq!(config.spawn.region.size(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_rate = SimulationConfig::default().with_mass_rate(-1.0);
        assert!(matches!(bad_rate.validate(), Err(ConfigError::Invalid(_))));

        let result = SimulationConfig::from_toml_str("[spawn]\nanomaly_range = [10.0, 1.0]\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let empty = SimulationConfig::default()
            .with_region(BoundingBox::around(Vec2::zero(), 0.0));
        assert!(matches!(empty.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validation_rejects_region_wider_than_f64() {
        // Both corners are finite but the width overflows
        let wide = SimulationConfig::default()
            .with_region(BoundingBox::new(Vec2::new(-1e308, -1.0), Vec2::new(1e308, 1.0)));
        assert!(matches!(wide.validate(), Err(ConfigError::Invalid(_))));

        let result = SimulationConfig::from_toml_str(
            "[spawn.region]\ntop = { x = -1.5e308, y = 0.0 }\nbot = { x = 1.5e308, y = 10.0 }\n",
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_error() {
        let result = SimulationConfig::from_toml_str("[spawn\ncount = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("anomaloid-config-{}.toml", std::process::id()));

        let config = SimulationConfig::default().with_count(12).with_seed(99);
        config.save_to_file(&path).unwrap();
        let loaded = SimulationConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_format() {
        let result = SimulationConfig::load_from_file("settings.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));

        let missing = SimulationConfig::load_from_file("/nonexistent/anomaloid.toml");
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
