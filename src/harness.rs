//! Dual-precision comparison.
//!
//! Runs one stimulus through the model twice, once in the model's
//! fixed-point format (the device under test) and once in double precision
//! (the reference), and reports the worst deviation of one output:
//!
//! ```text
//! absolute = |ref - dut|
//! relative = 100 * |1 - ref / dut|     (percent, relative to the DUT value)
//! ```
//!
//! Samples where the DUT value is exactly zero have no relative deviation.
//! They are skipped and counted rather than aborting the run.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Result, SwitchSimError};
use crate::model::{validate_model, ModelConfig};
use crate::sim::Simulator;
use crate::stimulus::Stimulus;

/// Worst-case deviation between the reference and fixed-point runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviationReport {
    /// Number of compared samples.
    pub samples: usize,
    pub max_absolute_deviation: f64,
    /// In percent.
    pub max_relative_deviation: f64,
    /// Samples left out of the relative maximum because the DUT value was
    /// zero.
    pub skipped_relative: usize,
}

impl fmt::Display for DeviationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Maximum absolute Deviation            : {}", self.max_absolute_deviation)?;
        write!(f, "Maximum relative Deviation in Percent : {}", self.max_relative_deviation)
    }
}

/// `|reference - dut|`
pub fn absolute_deviation(reference: f64, dut: f64) -> f64 {
    (reference - dut).abs()
}

/// `100 * |1 - reference / dut|`, undefined when `dut` is zero.
pub fn relative_deviation(index: usize, reference: f64, dut: f64) -> Result<f64> {
    if dut == 0.0 {
        return Err(SwitchSimError::DivisionByZero { index });
    }
    Ok(100.0 * (1.0 - reference / dut).abs())
}

/// Compare two equally long output sequences.
pub fn compare_sequences(reference: &[f64], dut: &[f64]) -> Result<DeviationReport> {
    if reference.len() != dut.len() {
        return Err(SwitchSimError::LengthMismatch {
            reference: reference.len(),
            dut: dut.len(),
        });
    }

    let mut report = DeviationReport {
        samples: reference.len(),
        ..DeviationReport::default()
    };

    for (index, (&r, &d)) in reference.iter().zip(dut).enumerate() {
        let abs = absolute_deviation(r, d);
        if abs >= report.max_absolute_deviation {
            report.max_absolute_deviation = abs;
        }

        match relative_deviation(index, r, d) {
            Ok(rel) => {
                if rel >= report.max_relative_deviation {
                    report.max_relative_deviation = rel;
                }
            }
            Err(e) => {
                warn!(%e, "skipping sample in relative deviation");
                report.skipped_relative += 1;
            }
        }
    }

    Ok(report)
}

/// Runs a model in both numeric configurations and compares one output.
#[derive(Debug, Clone)]
pub struct DualPrecisionHarness {
    model: ModelConfig,
    output: usize,
}

impl DualPrecisionHarness {
    /// Compare the model's first output.
    pub fn new(model: ModelConfig) -> Result<Self> {
        validate_model(&model)?;
        Ok(Self { model, output: 0 })
    }

    /// Compare the named output instead.
    pub fn with_output(mut self, name: &str) -> Result<Self> {
        self.output = self
            .model
            .output_index(name)
            .ok_or_else(|| SwitchSimError::UnknownSignal { name: name.to_string() })?;
        Ok(self)
    }

    /// Name of the compared output.
    pub fn output_name(&self) -> &str {
        &self.model.outputs[self.output].name
    }

    /// Run both configurations from their initial state and return the
    /// `(reference, dut)` output sequences.
    pub fn run(&self, stimulus: &Stimulus) -> Result<(Vec<f64>, Vec<f64>)> {
        let mut dut = Simulator::fixed(&self.model)?;
        let mut reference = Simulator::float(&self.model)?;

        let dut_out = dut
            .run(stimulus)?
            .into_iter()
            .map(|step| step.outputs[self.output])
            .collect();
        let ref_out = reference
            .run(stimulus)?
            .into_iter()
            .map(|step| step.outputs[self.output])
            .collect();

        Ok((ref_out, dut_out))
    }

    /// Run both configurations and report the maxima.
    pub fn compare(&self, stimulus: &Stimulus) -> Result<DeviationReport> {
        let (reference, dut) = self.run(stimulus)?;
        let report = compare_sequences(&reference, &dut)?;
        let format = format!("{}/{}", self.model.format.total_bits, self.model.format.frac_bits);
        info!(
            model = %self.model.name,
            output = self.output_name(),
            format = %format,
            max_abs = report.max_absolute_deviation,
            max_rel = report.max_relative_deviation,
            "dual-precision comparison finished"
        );
        Ok(report)
    }
}
