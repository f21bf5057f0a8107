//! Built-in example circuits.
//!
//! The coefficient tables are what the model generator emits for these
//! circuits with forward-Euler discretisation.

use crate::numeric::FixedFormat;

use super::{AffineDef, DiodeDef, ModelConfig, OutputDef, StateDef, UpdateOrder};

/// Names accepted by [`by_name`].
pub const NAMES: [&str; 2] = ["buck", "rc"];

/// dt / L and dt / C for the buck converter: 0.25us / 10uH and 0.25us / 10uF.
const BUCK_GAIN: f64 = 0.024999999999999998;

/// Look up a built-in model.
pub fn by_name(name: &str) -> Option<ModelConfig> {
    match name {
        "buck" => Some(buck()),
        "rc" => Some(rc()),
        _ => None,
    }
}

/// Diode-rectified buck converter.
///
/// One MOSFET switch `M0` between the supply and the switch node, one
/// freewheeling diode `D0` from ground to the switch node, an LC filter
/// (10uH, 10uF) and a load current input `i_load` drawn from the output.
///
/// Mode layout is `(D0, M0)`: mode 1 is the switch conducting, mode 2 the
/// diode freewheeling, mode 0 both off (the inductor current is reset to
/// zero, discontinuous conduction).
pub fn buck() -> ModelConfig {
    let g = BUCK_GAIN;

    ModelConfig {
        name: "buck".to_string(),
        timestep_ps: 250_000,
        // 25 bits wide with 12 integer bits
        format: FixedFormat {
            total_bits: 25,
            frac_bits: 13,
        },
        update_order: UpdateOrder::Sequential,
        inputs: vec!["v_in".to_string(), "i_load".to_string()],
        switches: vec!["M0".to_string()],
        states: vec![
            StateDef {
                name: "i_L0".to_string(),
                initial: 0.0,
                update: AffineDef::default()
                    .with_const(vec![0.0; 4])
                    .with_gain("i_L0", vec![0.0, 1.0, 1.0, 0.0])
                    .with_gain("v_C0", vec![0.0, -g, -g, 0.0])
                    .with_gain("v_in", vec![0.0, g, 0.0, 0.0]),
            },
            StateDef {
                name: "v_C0".to_string(),
                initial: 0.0,
                update: AffineDef::default()
                    .with_const(vec![0.0; 4])
                    .with_gain("i_L0", vec![0.0, g, g, 0.0])
                    .with_gain("i_load", vec![-g, -g, -g, 0.0])
                    .with_gain("v_C0", vec![1.0, 1.0, 1.0, 0.0]),
            },
        ],
        diodes: vec![DiodeDef {
            name: "D0".to_string(),
            current: AffineDef::default()
                .with_const(vec![0.0; 4])
                .with_gain("i_L0", vec![0.0, 0.0, 1.0, 0.0]),
            voltage: AffineDef::default()
                .with_const(vec![0.0; 4])
                .with_gain("v_C0", vec![-1.0, 0.0, 0.0, 0.0])
                .with_gain("v_in", vec![0.0, -1.0, 0.0, 0.0]),
        }],
        outputs: vec![OutputDef {
            name: "v_out".to_string(),
            expr: AffineDef::default()
                .with_const(vec![0.0; 4])
                .with_gain("v_C0", vec![1.0, 1.0, 1.0, 0.0]),
        }],
    }
}

/// First-order RC low-pass, 1k / 1nF sampled every 10ns.
pub fn rc() -> ModelConfig {
    let a = 0.01;

    ModelConfig {
        name: "rc".to_string(),
        timestep_ps: 10_000,
        format: FixedFormat {
            total_bits: 25,
            frac_bits: 13,
        },
        update_order: UpdateOrder::Sequential,
        inputs: vec!["v_in".to_string()],
        switches: Vec::new(),
        states: vec![StateDef {
            name: "v_C0".to_string(),
            initial: 0.0,
            update: AffineDef::default()
                .with_gain("v_C0", vec![1.0 - a])
                .with_gain("v_in", vec![a]),
        }],
        diodes: Vec::new(),
        outputs: vec![OutputDef {
            name: "v_out".to_string(),
            expr: AffineDef::default().with_gain("v_C0", vec![1.0]),
        }],
    }
}
