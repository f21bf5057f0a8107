//! Main simulator interface.

use crate::error::{Result, SwitchSimError};
use crate::model::ModelConfig;
use crate::numeric::{Arithmetic, FixedFormat, Float64};
use crate::stimulus::{Stimulus, StimulusSample};

use super::engine::AffineEngine;
use super::mode::{Mode, ModeResolver, SwitchBits};

/// What one step reports to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    /// Mode the step was evaluated in.
    pub mode: Mode,
    /// Output values in declaration order.
    pub outputs: Vec<f64>,
}

/// A running instance of one model in one numeric configuration.
///
/// Owns the state vector and the diode latches; both persist across
/// [`step`](Simulator::step) calls until [`reset`](Simulator::reset).
pub struct Simulator<A: Arithmetic> {
    engine: AffineEngine<A>,
    resolver: ModeResolver,
    state: Vec<A::Value>,
    initial: Vec<A::Value>,
    /// Quantised inputs for the current step
    inputs: Vec<A::Value>,
    steps: u64,
}

impl Simulator<FixedFormat> {
    /// Simulator in the model's fixed-point format.
    pub fn fixed(model: &ModelConfig) -> Result<Self> {
        Self::new(model, model.format)
    }
}

impl Simulator<Float64> {
    /// Double-precision reference simulator.
    pub fn float(model: &ModelConfig) -> Result<Self> {
        Self::new(model, Float64)
    }
}

impl<A: Arithmetic> Simulator<A> {
    /// Create a simulator for `model` using the given numeric configuration.
    pub fn new(model: &ModelConfig, arith: A) -> Result<Self> {
        let engine = AffineEngine::new(model, arith)?;
        let resolver = ModeResolver::new(model.switches.len(), model.diodes.iter().map(|d| d.name.clone()));
        let initial: Vec<A::Value> = model
            .states
            .iter()
            .map(|s| engine.arithmetic().quantize(s.initial))
            .collect();
        let inputs = vec![engine.arithmetic().zero(); model.inputs.len()];

        Ok(Self {
            engine,
            resolver,
            state: initial.clone(),
            initial,
            inputs,
            steps: 0,
        })
    }

    /// Advance by one step.
    ///
    /// The mode is resolved from the latches left by the previous step and
    /// the given switch bits. The latches are then re-evaluated for the
    /// next step.
    pub fn step(&mut self, switches: SwitchBits, inputs: &[f64]) -> Result<StepOutput> {
        if inputs.len() != self.inputs.len() {
            return Err(SwitchSimError::InputCount {
                expected: self.inputs.len(),
                found: inputs.len(),
            });
        }

        let mode = self.resolver.resolve(switches)?;

        let arith = self.engine.arithmetic();
        for (slot, &value) in self.inputs.iter_mut().zip(inputs) {
            *slot = arith.quantize(value);
        }

        let result = self.engine.step(&mut self.state, &self.inputs, mode.index());
        self.resolver.update(self.engine.arithmetic(), &result.diodes, self.steps);
        self.steps += 1;

        let arith = self.engine.arithmetic();
        Ok(StepOutput {
            mode,
            outputs: result.outputs.into_iter().map(|v| arith.to_f64(v)).collect(),
        })
    }

    /// Advance by one stimulus sample.
    pub fn step_sample(&mut self, sample: &StimulusSample) -> Result<StepOutput> {
        self.step(sample.switches, &sample.inputs)
    }

    /// Run a whole stimulus sequence from the current state.
    pub fn run(&mut self, stimulus: &Stimulus) -> Result<Vec<StepOutput>> {
        stimulus.iter().map(|sample| self.step_sample(sample)).collect()
    }

    /// Restore initial state, open every diode and zero the step counter.
    pub fn reset(&mut self) {
        self.state.clone_from(&self.initial);
        self.resolver.reset();
        self.steps = 0;
    }

    /// State values converted to f64, in declaration order.
    pub fn state(&self) -> Vec<f64> {
        let arith = self.engine.arithmetic();
        self.state.iter().map(|&v| arith.to_f64(v)).collect()
    }

    /// Raw state values in the simulator's representation.
    pub fn state_values(&self) -> &[A::Value] {
        &self.state
    }

    /// Diode latch states, in declaration order.
    pub fn latches(&self) -> Vec<bool> {
        self.resolver.latches()
    }

    /// Force a diode latch before the next step.
    pub fn set_latch(&mut self, index: usize, on: bool) {
        self.resolver.set_latch(index, on);
    }

    /// Mode the next step will use for the given switch bits.
    pub fn peek_mode(&self, switches: SwitchBits) -> Result<Mode> {
        self.resolver.resolve(switches)
    }

    /// Number of steps taken since construction or the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// The numeric configuration.
    pub fn arithmetic(&self) -> &A {
        self.engine.arithmetic()
    }

    /// Number of bits in the mode index.
    pub fn mode_bits(&self) -> usize {
        self.resolver.mode_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builtin;
    use approx::assert_relative_eq;

    #[test]
    fn test_rc_step_response() {
        let model = builtin::rc();
        let mut sim = Simulator::float(&model).unwrap();
        let stim = Stimulus::gated(1000, 0, SwitchBits::OPEN, vec![1.0]);
        let out = sim.run(&stim).unwrap();
        // v = 1 - 0.99^n
        assert_relative_eq!(out[0].outputs[0], 0.01, epsilon = 1e-12);
        assert_relative_eq!(out[999].outputs[0], 1.0 - 0.99f64.powi(1000), epsilon = 1e-9);
    }

    #[test]
    fn test_buck_diode_blocks_while_capacitor_charged() {
        let model = builtin::buck();
        let mut sim = Simulator::float(&model).unwrap();

        // Switch on: inductor charges, diode reverse biased
        for _ in 0..5 {
            let out = sim.step(SwitchBits(1), &[6.6, 0.0]).unwrap();
            assert_eq!(out.mode.index(), 1);
        }
        assert_eq!(sim.latches(), vec![false]);

        // Switch opens: mode 0 resets the inductor and the diode sees -v_C,
        // which is negative, so it stays off
        let out = sim.step(SwitchBits(0), &[6.6, 0.0]).unwrap();
        assert_eq!(out.mode.index(), 0);
        assert_eq!(sim.latches(), vec![false]);
    }

    #[test]
    fn test_latch_applies_one_step_later() {
        let model = builtin::buck();
        let mut sim = Simulator::float(&model).unwrap();
        for _ in 0..5 {
            sim.step(SwitchBits(1), &[6.6, 0.0]).unwrap();
        }
        let i_l = sim.state()[0];
        assert!(i_l > 0.0);

        // Freewheel with the diode forced on: mode 2 while current flows
        sim.set_latch(0, true);
        let out = sim.step(SwitchBits(0), &[6.6, 0.0]).unwrap();
        assert_eq!(out.mode.index(), 2);
        assert_eq!(sim.latches(), vec![true]);

        // Drain the inductor; the step that first computes i_D <= 0 still
        // runs in mode 2, the following one in mode 0
        let mut modes = Vec::new();
        for _ in 0..200 {
            modes.push(sim.step(SwitchBits(0), &[6.6, 0.0]).unwrap().mode.index());
        }
        let first_off = modes.iter().position(|&m| m == 0).unwrap();
        assert!(first_off > 0);
        assert!(modes[..first_off].iter().all(|&m| m == 2));
        assert!(modes[first_off..].iter().all(|&m| m == 0));
    }

    #[test]
    fn test_peek_mode_matches_next_step() {
        let model = builtin::buck();
        let mut sim = Simulator::fixed(&model).unwrap();
        sim.set_latch(0, true);
        let peeked = sim.peek_mode(SwitchBits(0)).unwrap();
        assert_eq!(peeked.index(), 2);
        assert_eq!(sim.steps(), 0);

        let out = sim.step(SwitchBits(0), &[6.6, 0.0]).unwrap();
        assert_eq!(out.mode, peeked);
        assert!(matches!(
            sim.peek_mode(SwitchBits(2)),
            Err(SwitchSimError::SwitchOutOfRange { .. })
        ));
    }

    #[test]
    fn test_state_values_are_raw() {
        let model = builtin::rc();
        let mut sim = Simulator::fixed(&model).unwrap();
        sim.step(SwitchBits::OPEN, &[1.0]).unwrap();
        let format = model.format;
        let raw = sim.state_values()[0];
        assert_relative_eq!(format.to_f64(raw), sim.state()[0]);
        assert!(raw.raw() > 0);
    }

    #[test]
    fn test_unvalidated_format_rejected() {
        let format = FixedFormat {
            total_bits: 0,
            frac_bits: 0,
        };
        assert!(matches!(
            Simulator::new(&builtin::rc(), format),
            Err(SwitchSimError::InvalidFormat { total_bits: 0, frac_bits: 0 })
        ));
    }

    #[test]
    fn test_input_count_checked() {
        let mut sim = Simulator::float(&builtin::buck()).unwrap();
        assert!(matches!(
            sim.step(SwitchBits(1), &[6.6]),
            Err(SwitchSimError::InputCount { expected: 2, found: 1 })
        ));
        assert_eq!(sim.steps(), 0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut model = builtin::rc();
        model.states[0].initial = 2.0;
        let mut sim = Simulator::fixed(&model).unwrap();
        sim.step(SwitchBits::OPEN, &[0.0]).unwrap();
        assert!(sim.state()[0] < 2.0);
        sim.reset();
        assert_relative_eq!(sim.state()[0], 2.0);
        assert_eq!(sim.steps(), 0);
    }

    #[test]
    fn test_deterministic_replay() {
        let model = builtin::buck();
        let stim = Stimulus::ramp(20, 0.0, 12.0, 3, SwitchBits(1), 2);

        let mut sim = Simulator::fixed(&model).unwrap();
        let first = sim.run(&stim).unwrap();
        sim.reset();
        let second = sim.run(&stim).unwrap();
        let fresh = Simulator::fixed(&model).unwrap().run(&stim).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, fresh);
        assert_eq!(first.len(), 20);
    }
}
