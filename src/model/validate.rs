//! Model validation.

use std::collections::HashSet;

use crate::error::{Result, SwitchSimError};
use crate::numeric::Arithmetic;

use super::{AffineDef, ModelConfig, MAX_MODE_BITS, MODE_SIGNAL};

/// Validate a model for simulation.
///
/// Checks:
/// - The numeric format is representable
/// - The mode index fits in [`MAX_MODE_BITS`] bits
/// - Names are unique across states, inputs, switches, diodes and outputs
/// - Every table has exactly one entry per mode
/// - Every gain multiplies a declared state or input
pub fn validate_model(model: &ModelConfig) -> Result<()> {
    if model.name.trim().is_empty() {
        return Err(SwitchSimError::invalid_model("", "model name is empty"));
    }

    model.format.validate()?;

    if model.timestep_ps == 0 {
        return Err(SwitchSimError::invalid_model(&model.name, "timestep_ps must be positive"));
    }

    if model.mode_bits() > MAX_MODE_BITS {
        return Err(SwitchSimError::invalid_model(
            &model.name,
            format!(
                "{} diodes and switches exceed the limit of {} mode bits",
                model.mode_bits(),
                MAX_MODE_BITS
            ),
        ));
    }

    if model.outputs.is_empty() {
        return Err(SwitchSimError::invalid_model(&model.name, "model has no outputs"));
    }

    let mut seen = HashSet::new();
    let names = model
        .states
        .iter()
        .map(|s| s.name.as_str())
        .chain(model.inputs.iter().map(String::as_str))
        .chain(model.switches.iter().map(String::as_str))
        .chain(model.diodes.iter().map(|d| d.name.as_str()))
        .chain(model.outputs.iter().map(|o| o.name.as_str()));
    for name in names {
        if name.trim().is_empty() || name == MODE_SIGNAL || name.contains(char::is_whitespace) {
            return Err(SwitchSimError::invalid_model(
                &model.name,
                format!("'{}' is not a usable signal name", name),
            ));
        }
        if !seen.insert(name) {
            return Err(SwitchSimError::DuplicateName {
                model: model.name.clone(),
                name: name.to_string(),
            });
        }
    }

    let operands: HashSet<&str> = model
        .states
        .iter()
        .map(|s| s.name.as_str())
        .chain(model.inputs.iter().map(String::as_str))
        .collect();
    let modes = model.mode_count();

    for state in &model.states {
        check_affine(&state.name, &state.update, &operands, modes)?;
    }
    for diode in &model.diodes {
        check_affine(&format!("i_{}", diode.name), &diode.current, &operands, modes)?;
        check_affine(&format!("v_{}", diode.name), &diode.voltage, &operands, modes)?;
    }
    for output in &model.outputs {
        check_affine(&output.name, &output.expr, &operands, modes)?;
    }

    Ok(())
}

fn check_affine(row: &str, def: &AffineDef, operands: &HashSet<&str>, modes: usize) -> Result<()> {
    if !def.constant.is_empty() && def.constant.len() != modes {
        return Err(SwitchSimError::table_length(
            format!("{}_const", row),
            modes,
            def.constant.len(),
        ));
    }

    for (source, values) in &def.gains {
        if !operands.contains(source.as_str()) {
            return Err(SwitchSimError::UnknownOperand {
                row: row.to_string(),
                operand: source.clone(),
            });
        }
        if values.len() != modes {
            return Err(SwitchSimError::table_length(
                format!("{}_to_{}", source, row),
                modes,
                values.len(),
            ));
        }
    }

    Ok(())
}
