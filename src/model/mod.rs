//! Circuit model configuration.
//!
//! A model is the per-circuit data produced by an upstream model generator:
//! the names of states, inputs, switches, diodes and outputs, and one
//! coefficient table per derived quantity with one entry per mode.
//!
//! # Document format
//!
//! Models are read from YAML or JSON:
//!
//! ```text
//! name: rc
//! timestep_ps: 10000
//! format: { total_bits: 25, frac_bits: 13 }
//! inputs: [v_in]
//! states:
//!   - name: v_C0
//!     gains: { v_C0: [0.99], v_in: [0.01] }
//! outputs:
//!   - name: v_out
//!     gains: { v_C0: [1.0] }
//! ```
//!
//! Every table (`const` and each entry of `gains`) holds `mode_count`
//! values, where `mode_count = 2^(diodes + switches)`. A missing `const`
//! means zero offsets in every mode. Gain keys name a state or an input.

pub mod builtin;
mod validate;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitchSimError};
use crate::numeric::FixedFormat;

pub use validate::validate_model;

/// Upper bound on `diodes + switches`, which keeps table sizes sane.
pub const MAX_MODE_BITS: usize = 16;

/// Signal name reserved for the mode index in waveform traces.
pub const MODE_SIGNAL: &str = "mode";

fn default_timestep_ps() -> u64 {
    1000
}

/// Order in which state updates observe each other within one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOrder {
    /// States are updated in declaration order, in place: a later state
    /// sees the already-updated value of an earlier one.
    #[default]
    Sequential,
    /// Every state update reads the state vector from before the step.
    Simultaneous,
}

/// An affine expression `const[mode] + sum(gains[source][mode] * source)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffineDef {
    /// Constant offset per mode. Empty means zero.
    #[serde(rename = "const", default, skip_serializing_if = "Vec::is_empty")]
    pub constant: Vec<f64>,
    /// Gain per mode, keyed by the state or input it multiplies.
    #[serde(default)]
    pub gains: BTreeMap<String, Vec<f64>>,
}

impl AffineDef {
    /// Add a gain table.
    pub fn with_gain(mut self, source: impl Into<String>, values: Vec<f64>) -> Self {
        self.gains.insert(source.into(), values);
        self
    }

    /// Set the constant offsets.
    pub fn with_const(mut self, values: Vec<f64>) -> Self {
        self.constant = values;
        self
    }
}

/// A continuous state variable and its update rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDef {
    pub name: String,
    /// Value after construction and after every reset.
    #[serde(default)]
    pub initial: f64,
    #[serde(flatten)]
    pub update: AffineDef,
}

/// An ideal diode: the branch quantities whose signs drive its latch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiodeDef {
    pub name: String,
    /// Branch current, tested against the turn-off threshold.
    pub current: AffineDef,
    /// Branch voltage, tested against the turn-on threshold.
    pub voltage: AffineDef,
}

/// An observed output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDef {
    pub name: String,
    #[serde(flatten)]
    pub expr: AffineDef,
}

/// A complete circuit model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    /// Simulated time per step, in picoseconds.
    #[serde(default = "default_timestep_ps")]
    pub timestep_ps: u64,
    /// Fixed-point format used by the hardware configuration.
    pub format: FixedFormat,
    #[serde(default)]
    pub update_order: UpdateOrder,
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Externally controlled switches, most significant first.
    #[serde(default)]
    pub switches: Vec<String>,
    pub states: Vec<StateDef>,
    /// Ideal diodes, most significant first.
    #[serde(default)]
    pub diodes: Vec<DiodeDef>,
    pub outputs: Vec<OutputDef>,
}

impl ModelConfig {
    /// Number of bits in the mode index.
    pub fn mode_bits(&self) -> usize {
        self.diodes.len() + self.switches.len()
    }

    /// Number of modes, which is also the length of every table.
    pub fn mode_count(&self) -> usize {
        1usize << self.mode_bits().min(MAX_MODE_BITS)
    }

    /// State names in declaration order.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|s| s.name.as_str())
    }

    /// Output names in declaration order.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|o| o.name.as_str())
    }

    /// Index of an output by name.
    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|o| o.name == name)
    }

    /// Parse and validate a YAML model document.
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let model: Self = serde_yaml::from_str(input).map_err(|e| SwitchSimError::ModelParse {
            message: e.to_string(),
        })?;
        validate_model(&model)?;
        Ok(model)
    }

    /// Parse and validate a JSON model document.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(input).map_err(|e| SwitchSimError::ModelParse {
            message: e.to_string(),
        })?;
        validate_model(&model)?;
        Ok(model)
    }

    /// Load a model file. `.json` files are read as JSON, anything else as
    /// YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SwitchSimError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| SwitchSimError::ModelParse {
            message: e.to_string(),
        })
    }
}
