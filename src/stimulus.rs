//! Stimulus sequences driving the simulation loop.
//!
//! A stimulus is one [`StimulusSample`] per step: the switch bits and one
//! value per declared model input. Sequences are either built with the
//! generators here or read from a YAML/JSON list:
//!
//! ```text
//! - { switches: 1, inputs: [6.6, 0.0] }
//! - { switches: 0, inputs: [6.6, 0.0] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitchSimError};
use crate::sim::SwitchBits;

/// Inputs for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusSample {
    #[serde(default)]
    pub switches: SwitchBits,
    #[serde(default)]
    pub inputs: Vec<f64>,
}

impl StimulusSample {
    pub fn new(switches: SwitchBits, inputs: Vec<f64>) -> Self {
        Self { switches, inputs }
    }
}

/// An ordered sequence of samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stimulus {
    samples: Vec<StimulusSample>,
}

/// Gate state at step `i` when the gate toggles every `toggle_every` steps,
/// starting from open and toggling at step 0.
fn gate_on(i: usize, toggle_every: usize) -> bool {
    toggle_every != 0 && (i / toggle_every) % 2 == 0
}

impl Stimulus {
    pub fn new(samples: Vec<StimulusSample>) -> Self {
        Self { samples }
    }

    /// Constant inputs with a square gate: `on` is applied for
    /// `toggle_every` steps, then all switches open for `toggle_every`
    /// steps, and so on. `toggle_every == 0` keeps the switches open.
    pub fn gated(len: usize, toggle_every: usize, on: SwitchBits, inputs: Vec<f64>) -> Self {
        let samples = (0..len)
            .map(|i| {
                let switches = if gate_on(i, toggle_every) { on } else { SwitchBits::OPEN };
                StimulusSample::new(switches, inputs.clone())
            })
            .collect();
        Self { samples }
    }

    /// `input_count` inputs per sample: the first swept linearly from `lo`
    /// toward `hi` (sample `i` is `lo + i / len * (hi - lo)`), the rest held
    /// at zero, with the same gate pattern as [`gated`](Stimulus::gated).
    /// With no inputs only the gate pattern remains.
    pub fn ramp(len: usize, lo: f64, hi: f64, toggle_every: usize, on: SwitchBits, input_count: usize) -> Self {
        let samples = (0..len)
            .map(|i| {
                let switches = if gate_on(i, toggle_every) { on } else { SwitchBits::OPEN };
                let mut inputs = vec![0.0; input_count];
                if let Some(first) = inputs.first_mut() {
                    *first = i as f64 / len as f64 * (hi - lo) + lo;
                }
                StimulusSample::new(switches, inputs)
            })
            .collect();
        Self { samples }
    }

    /// Parse a YAML sample list.
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|e| SwitchSimError::StimulusParse {
            message: e.to_string(),
        })
    }

    /// Parse a JSON sample list.
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| SwitchSimError::StimulusParse {
            message: e.to_string(),
        })
    }

    /// Load a stimulus file, JSON for `.json` and YAML otherwise.
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

    pub fn push(&mut self, sample: StimulusSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[StimulusSample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StimulusSample> {
        self.samples.iter()
    }
}

impl<'a> IntoIterator for &'a Stimulus {
    type Item = &'a StimulusSample;
    type IntoIter = std::slice::Iter<'a, StimulusSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gate_pattern() {
        let stim = Stimulus::gated(6, 2, SwitchBits(1), vec![6.6]);
        let bits: Vec<u32> = stim.iter().map(|s| s.switches.0).collect();
        assert_eq!(bits, vec![1, 1, 0, 0, 1, 1]);
        assert!(stim.iter().all(|s| s.inputs == vec![6.6]));
    }

    #[test]
    fn test_zero_toggle_keeps_switches_open() {
        let stim = Stimulus::gated(3, 0, SwitchBits(1), vec![1.0]);
        assert!(stim.iter().all(|s| s.switches == SwitchBits::OPEN));
    }

    #[test]
    fn test_ramp() {
        let stim = Stimulus::ramp(4, -400.0, 400.0, 10, SwitchBits(1), 2);
        assert_eq!(stim.len(), 4);
        let first: Vec<f64> = stim.iter().map(|s| s.inputs[0]).collect();
        assert_relative_eq!(first[0], -400.0);
        assert_relative_eq!(first[1], -200.0);
        assert_relative_eq!(first[3], 200.0);
        assert!(stim.iter().all(|s| s.inputs[1] == 0.0 && s.switches == SwitchBits(1)));
    }

    #[test]
    fn test_ramp_without_inputs() {
        let stim = Stimulus::ramp(4, -1.0, 1.0, 2, SwitchBits(1), 0);
        assert_eq!(stim.len(), 4);
        assert!(stim.iter().all(|s| s.inputs.is_empty()));
        let bits: Vec<u32> = stim.iter().map(|s| s.switches.0).collect();
        assert_eq!(bits, vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_parse_yaml() {
        let stim = Stimulus::from_yaml_str(
            "- { switches: 1, inputs: [6.6, 0.0] }\n- { inputs: [6.6, 0.5] }\n",
        )
        .unwrap();
        assert_eq!(stim.len(), 2);
        assert_eq!(stim.samples()[0].switches, SwitchBits(1));
        assert_eq!(stim.samples()[1].switches, SwitchBits::OPEN);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Stimulus::from_json_str("{\"not\": \"a list\"}"),
            Err(SwitchSimError::StimulusParse { .. })
        ));
    }
}
