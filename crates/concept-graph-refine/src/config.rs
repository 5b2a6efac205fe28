//! Refinement feature toggles.
//!
//! A `RefinementConfig` is an immutable value handed to the operator. It can
//! be written as TOML:
//!
//! ```toml
//! use_negation = true
//! use_universal_restriction = true
//! use_disjunction = true
//! use_data_properties = false
//! max_disjunction_size = 3
//! ```
//!
//! Missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RefineError, RefineResult};

/// Which constructors the refinement operator may introduce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementConfig {
    /// Allow negated classes (`¬A`) as labels.
    #[serde(default = "RefinementConfig::default_true")]
    pub use_negation: bool,

    /// Allow universal restrictions (`∀R.C`).
    #[serde(default = "RefinementConfig::default_true")]
    pub use_universal_restriction: bool,

    /// Allow disjunctive label sets (`A ⊔ B`).
    #[serde(default = "RefinementConfig::default_true")]
    pub use_disjunction: bool,

    /// Allow numeric data restrictions (`∃p.≥ v`).
    #[serde(default)]
    pub use_data_properties: bool,

    /// Also extend along inverse properties (`∃R⁻.⊤`).
    #[serde(default)]
    pub use_inverse_properties: bool,

    /// Largest disjunct set generated when specializing `⊤`.
    #[serde(default = "RefinementConfig::default_max_disjunction_size")]
    pub max_disjunction_size: usize,

    /// Cap on thresholds kept per data property.
    #[serde(default = "RefinementConfig::default_max_data_thresholds")]
    pub max_data_thresholds: usize,
}

impl RefinementConfig {
    fn default_true() -> bool {
        true
    }
    fn default_max_disjunction_size() -> usize {
        3
    }
    fn default_max_data_thresholds() -> usize {
        16
    }

    /// Existential restrictions and conjunction only (the EL fragment).
    pub fn el() -> Self {
        Self {
            use_negation: false,
            use_universal_restriction: false,
            use_disjunction: false,
            use_data_properties: false,
            use_inverse_properties: false,
            ..Default::default()
        }
    }

    /// Every constructor enabled.
    pub fn full() -> Self {
        Self {
            use_data_properties: true,
            use_inverse_properties: true,
            ..Default::default()
        }
    }

    /// Parse from a TOML document and validate.
    pub fn from_toml_str(content: &str) -> RefineResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> RefineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), ?config, "refinement_config_loaded");
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> RefineResult<String> {
        Ok(toml::to_string(self)?)
    }

    /// Reject settings the operator cannot run with.
    pub fn validate(&self) -> RefineResult<()> {
        if self.use_disjunction && self.max_disjunction_size < 2 {
            return Err(RefineError::InvalidConfig {
                field: "max_disjunction_size",
                message: format!(
                    "{} (must be >= 2 when disjunction is enabled)",
                    self.max_disjunction_size
                ),
            });
        }
        if self.use_data_properties && self.max_data_thresholds == 0 {
            return Err(RefineError::InvalidConfig {
                field: "max_data_thresholds",
                message: "0 (must be >= 1 when data properties are enabled)".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            use_negation: true,
            use_universal_restriction: true,
            use_disjunction: true,
            use_data_properties: false,
            use_inverse_properties: false,
            max_disjunction_size: Self::default_max_disjunction_size(),
            max_data_thresholds: Self::default_max_data_thresholds(),
        }
    }
}
