//! Affine state update engine.
//!
//! For a mode `m` every derived quantity is
//!
//! ```text
//! q = const[m] + sum_j gain_j[m] * operand_j
//! ```
//!
//! where the operands are states and inputs. One step:
//!
//! 1. update every state (in place, or from a snapshot for
//!    [`UpdateOrder::Simultaneous`])
//! 2. evaluate diode branch current and voltage from the updated state
//! 3. evaluate outputs from the updated state
//!
//! All three use the mode resolved at the start of the step. The diode
//! quantities therefore describe the circuit as it was in that mode, and
//! the resulting latch change shows up one step later. This one-step lag
//! is a known approximation of fixed-timestep simulation compared to
//! zero-crossing detection.

use crate::error::Result;
use crate::model::{validate_model, AffineDef, ModelConfig, UpdateOrder};
use crate::numeric::Arithmetic;

/// Branch current and voltage of one diode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiodeQuantities<V> {
    pub current: V,
    pub voltage: V,
}

/// Everything a step produces apart from the new state.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult<V> {
    pub outputs: Vec<V>,
    pub diodes: Vec<DiodeQuantities<V>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    State(usize),
    Input(usize),
}

#[derive(Debug, Clone)]
struct Term<V> {
    operand: Operand,
    gains: Vec<V>,
}

/// One compiled coefficient row: constants and gains for every mode, in
/// the engine's numeric representation.
#[derive(Debug, Clone)]
struct AffineRow<V> {
    constant: Vec<V>,
    terms: Vec<Term<V>>,
}

impl<V: Copy> AffineRow<V> {
    fn compile<A>(arith: &A, def: &AffineDef, model: &ModelConfig) -> Self
    where
        A: Arithmetic<Value = V>,
    {
        let modes = model.mode_count();
        let constant = if def.constant.is_empty() {
            vec![arith.zero(); modes]
        } else {
            def.constant.iter().map(|&c| arith.quantize(c)).collect()
        };

        // Fixed operand order (states, then inputs) regardless of how the
        // document listed them, so float sums are reproducible.
        let operands = model
            .states
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.as_str(), Operand::State(i)))
            .chain(
                model
                    .inputs
                    .iter()
                    .enumerate()
                    .map(|(i, n)| (n.as_str(), Operand::Input(i))),
            );

        let terms = operands
            .filter_map(|(source, operand)| {
                def.gains.get(source).map(|values| Term {
                    operand,
                    gains: values.iter().map(|&g| arith.quantize(g)).collect(),
                })
            })
            .collect();

        Self { constant, terms }
    }

    fn eval<A>(&self, arith: &A, mode: usize, state: &[V], inputs: &[V]) -> V
    where
        A: Arithmetic<Value = V>,
    {
        arith.affine(
            self.constant[mode],
            self.terms.iter().map(|term| {
                let operand = match term.operand {
                    Operand::State(i) => state[i],
                    Operand::Input(i) => inputs[i],
                };
                (term.gains[mode], operand)
            }),
        )
    }
}

/// The per-mode update equations of one model, compiled for one numeric
/// configuration.
#[derive(Debug, Clone)]
pub struct AffineEngine<A: Arithmetic> {
    arith: A,
    update_order: UpdateOrder,
    mode_count: usize,
    input_count: usize,
    states: Vec<AffineRow<A::Value>>,
    diodes: Vec<(AffineRow<A::Value>, AffineRow<A::Value>)>,
    outputs: Vec<AffineRow<A::Value>>,
}

impl<A: Arithmetic> AffineEngine<A> {
    /// Validate `model` and quantise its tables into `arith`.
    pub fn new(model: &ModelConfig, arith: A) -> Result<Self> {
        validate_model(model)?;
        arith.validate()?;

        let states = model
            .states
            .iter()
            .map(|s| AffineRow::compile(&arith, &s.update, model))
            .collect();
        let diodes = model
            .diodes
            .iter()
            .map(|d| {
                (
                    AffineRow::compile(&arith, &d.current, model),
                    AffineRow::compile(&arith, &d.voltage, model),
                )
            })
            .collect();
        let outputs = model
            .outputs
            .iter()
            .map(|o| AffineRow::compile(&arith, &o.expr, model))
            .collect();

        Ok(Self {
            arith,
            update_order: model.update_order,
            mode_count: model.mode_count(),
            input_count: model.inputs.len(),
            states,
            diodes,
            outputs,
        })
    }

    /// The numeric configuration.
    pub fn arithmetic(&self) -> &A {
        &self.arith
    }

    pub fn mode_count(&self) -> usize {
        self.mode_count
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Advance `state` by one step in `mode` and evaluate diode quantities
    /// and outputs from the new state.
    ///
    /// # Panics
    ///
    /// If `mode` is out of range or the slices do not match the model.
    /// [`Simulator`](super::Simulator) checks both before calling.
    pub fn step(&self, state: &mut [A::Value], inputs: &[A::Value], mode: usize) -> StepResult<A::Value> {
        debug_assert!(mode < self.mode_count);
        debug_assert_eq!(state.len(), self.states.len());
        debug_assert_eq!(inputs.len(), self.input_count);

        match self.update_order {
            UpdateOrder::Sequential => {
                for (i, row) in self.states.iter().enumerate() {
                    let value = row.eval(&self.arith, mode, state, inputs);
                    state[i] = value;
                }
            }
            UpdateOrder::Simultaneous => {
                let previous = state.to_vec();
                for (i, row) in self.states.iter().enumerate() {
                    state[i] = row.eval(&self.arith, mode, &previous, inputs);
                }
            }
        }

        let diodes = self
            .diodes
            .iter()
            .map(|(current, voltage)| DiodeQuantities {
                current: current.eval(&self.arith, mode, state, inputs),
                voltage: voltage.eval(&self.arith, mode, state, inputs),
            })
            .collect();

        let outputs = self
            .outputs
            .iter()
            .map(|row| row.eval(&self.arith, mode, state, inputs))
            .collect();

        StepResult { outputs, diodes }
    }
}
