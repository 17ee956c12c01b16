//! Network construction settings, loadable from TOML.
//!
//! ```toml
//! temperature = 298.15
//! electron_free_energy = -2.15
//! coordinating_metals = ["Li", "Mg"]
//!
//! [redox]
//! inner_reorganization_energy = 0.8
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::element::Element;
use crate::rates::RedoxParameters;
use crate::reaction::REFERENCE_TEMPERATURE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse network configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read network configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid network configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Kelvin.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Free energy of an electron in eV; redox free energies are undefined without it.
    #[serde(default)]
    pub electron_free_energy: Option<f64>,
    /// Bond hops around the changed bonds that define a family template.
    #[serde(default = "default_environment_radius")]
    pub environment_radius: usize,
    /// Largest total charge change accepted for concerted candidates.
    #[serde(default)]
    pub allowed_charge_change: u32,
    #[serde(default = "default_coordinating_metals")]
    pub coordinating_metals: Vec<String>,
    /// Run the archetypes and trajectory analysis on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Cap on precursor resolutions per pathway; derived from the history length when unset.
    #[serde(default)]
    pub max_resolution_steps: Option<usize>,
    #[serde(default)]
    pub redox: RedoxParameters,
}

fn default_temperature() -> f64 {
    REFERENCE_TEMPERATURE
}
fn default_environment_radius() -> usize {
    1
}
fn default_coordinating_metals() -> Vec<String> {
    Element::COORDINATING_METALS
        .iter()
        .map(|e| e.symbol().to_string())
        .collect()
}
fn default_parallel() -> bool {
    true
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            electron_free_energy: None,
            environment_radius: default_environment_radius(),
            allowed_charge_change: 0,
            coordinating_metals: default_coordinating_metals(),
            parallel: default_parallel(),
            max_resolution_steps: None,
            redox: RedoxParameters::default(),
        }
    }
}

impl NetworkConfig {
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: NetworkConfig = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        self.metals()?;
        if let Some(lambda) = self.redox.inner_reorganization_energy {
            if lambda <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "inner reorganization energy must be positive, got {lambda}"
                )));
            }
        }
        Ok(())
    }

    /// The coordinating metals as elements.
    pub fn metals(&self) -> Result<Vec<Element>, ConfigError> {
        self.coordinating_metals
            .iter()
            .map(|s| {
                Element::from_symbol(s)
                    .ok_or_else(|| ConfigError::Invalid(format!("unknown metal symbol `{s}`")))
            })
            .collect()
    }

    /// Resolution cap for a trajectory of `history_len` steps.
    pub fn resolution_cap(&self, history_len: usize) -> usize {
        self.max_resolution_steps.unwrap_or(10 * history_len + 16)
    }
}
