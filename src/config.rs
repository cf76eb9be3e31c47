//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tdiag/tdiag.toml`
//! 3. Local config: explicit path passed by the caller
//! 4. Environment variables: `TDIAG_*` prefix
//!
//! The engine types also accept these structs directly; file/env loading is
//! optional convenience for embedding applications.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::errors::LayoutResult;

/// Canvas margins added around the geometry bounding box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Margins {
    pub x: f64,
    pub y: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self { x: 10.0, y: 10.0 }
    }
}

/// Weights of the scalar layout cost.
///
/// `total = alpha·bends² + beta·crossings + ratio_gap^gamma − 1` where
/// `ratio_gap` grows exponentially with the deviation of the canvas aspect
/// ratio from `preferred_aspect_ratio`. All weights are positive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CostWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub preferred_aspect_ratio: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 2.0,
            gamma: 1.0,
            preferred_aspect_ratio: 1.5,
        }
    }
}

/// Knobs of the generational search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Number of specimens kept alive across generations.
    pub population_size: usize,
    /// Per-node sampling probability for initial bend maps, and the
    /// per-key perturbation probability during breeding.
    pub mutation_prob: f64,
    /// Probability of dropping one bend key, and (independently) of adding
    /// one, while breeding a child.
    pub branch_prob: f64,
    /// Generation cap for `learn` convenience wrappers.
    pub max_generations: usize,
    /// Seed for the optimizer-owned RNG; equal seeds replay identical runs.
    pub seed: u64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            population_size: 20,
            mutation_prob: 0.1,
            branch_prob: 0.1,
            max_generations: 50,
            seed: 0x7D1A_6001,
        }
    }
}

/// Unified configuration for tdiag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub margins: Margins,
    pub weights: CostWeights,
    pub optimizer: OptimizerSettings,
}

/// Get the XDG config directory for tdiag.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tdiag").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tdiag.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_path` - Optional project-local config file
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/tdiag/tdiag.toml`
    /// 3. Local config file, when given
    /// 4. Environment variables: `TDIAG_*` (e.g. `TDIAG_OPTIMIZER__SEED=7`)
    pub fn load(local_path: Option<&Path>) -> LayoutResult<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path));
            }
        }

        if let Some(local) = local_path {
            builder = builder.add_source(File::from(local.to_path_buf()));
        }

        builder = builder.add_source(
            Environment::with_prefix("TDIAG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_sources_when_loading_then_defaults_apply() {
        let settings = Settings::default();
        assert_eq!(settings.optimizer.population_size, 20);
        assert!(settings.weights.alpha > 0.0);
        assert!(settings.margins.x > 0.0);
    }
}
