//! Recording simulator steps into a waveform session.

use std::io::Write;

use crate::error::Result;
use crate::model::{ModelConfig, MODE_SIGNAL};
use crate::numeric::Arithmetic;
use crate::sim::{Simulator, StepOutput};
use crate::stimulus::Stimulus;

use super::signal::TraceValue;
use super::writer::TraceWriter;

/// Registers a model's signals and records one step at a time.
///
/// Signals registered, in order: outputs and states as reals, each switch
/// and each diode as a 1-bit wire, and the mode index as a wire when the
/// model has any mode bits.
#[derive(Debug, Clone)]
pub struct SimulationProbe {
    outputs: Vec<String>,
    states: Vec<String>,
    switches: Vec<String>,
    diodes: Vec<String>,
    mode_bits: usize,
    timestep_ps: u64,
    time: u64,
}

impl SimulationProbe {
    /// Register every signal of `model` with `writer`.
    pub fn register<W: Write>(model: &ModelConfig, writer: &mut TraceWriter<W>) -> Result<Self> {
        let probe = Self {
            outputs: model.output_names().map(str::to_string).collect(),
            states: model.state_names().map(str::to_string).collect(),
            switches: model.switches.clone(),
            diodes: model.diodes.iter().map(|d| d.name.clone()).collect(),
            mode_bits: model.mode_bits(),
            timestep_ps: model.timestep_ps,
            time: 0,
        };

        for name in probe.outputs.iter().chain(&probe.states) {
            writer.register_real(name)?;
        }
        for name in probe.switches.iter().chain(&probe.diodes) {
            writer.register_wire(name, 1)?;
        }
        if probe.mode_bits > 0 {
            writer.register_wire(MODE_SIGNAL, probe.mode_bits as u32)?;
        }

        Ok(probe)
    }

    /// Simulated time of the next recorded step.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Record the step just taken by `sim` and advance time by one step.
    pub fn record<W: Write, A: Arithmetic>(
        &mut self,
        writer: &mut TraceWriter<W>,
        sim: &Simulator<A>,
        step: &StepOutput,
    ) -> Result<()> {
        writer.advance_time(self.time)?;

        for (name, &value) in self.outputs.iter().zip(&step.outputs) {
            writer.record(name, value)?;
        }
        for (name, value) in self.states.iter().zip(sim.state()) {
            writer.record(name, value)?;
        }

        let switch_count = self.switches.len();
        for (i, name) in self.switches.iter().enumerate() {
            writer.record(name, step.mode.switches.is_on(i, switch_count))?;
        }
        // Latches that selected this step's mode, not the ones just updated
        let diode_count = self.diodes.len();
        for (i, name) in self.diodes.iter().enumerate() {
            let on = (step.mode.diodes >> (diode_count - 1 - i)) & 1 == 1;
            writer.record(name, on)?;
        }
        if self.mode_bits > 0 {
            writer.record(MODE_SIGNAL, TraceValue::Bits(step.mode.index() as u64))?;
        }

        self.time += self.timestep_ps;
        Ok(())
    }

    /// Step `sim` through `stimulus`, recording every step.
    pub fn run<W: Write, A: Arithmetic>(
        &mut self,
        writer: &mut TraceWriter<W>,
        sim: &mut Simulator<A>,
        stimulus: &Stimulus,
    ) -> Result<Vec<StepOutput>> {
        let mut outputs = Vec::with_capacity(stimulus.len());
        for sample in stimulus {
            let step = sim.step_sample(sample)?;
            self.record(writer, sim, &step)?;
            outputs.push(step);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builtin;
    use crate::sim::SwitchBits;

    #[test]
    fn test_buck_signals() {
        let model = builtin::buck();
        let mut writer = TraceWriter::new(Vec::new()).with_date("fixed");
        SimulationProbe::register(&model, &mut writer).unwrap();

        let names: Vec<(&str, char)> = writer
            .symbols()
            .signals()
            .iter()
            .map(|s| (s.name.as_str(), s.symbol))
            .collect();
        assert_eq!(
            names,
            vec![
                ("v_out", '!'),
                ("i_L0", '"'),
                ("v_C0", '#'),
                ("M0", '$'),
                ("D0", '%'),
                ("mode", '&'),
            ]
        );
    }

    #[test]
    fn test_rc_has_no_mode_signal() {
        let model = builtin::rc();
        let mut writer = TraceWriter::new(Vec::new());
        SimulationProbe::register(&model, &mut writer).unwrap();
        assert!(writer.symbol(MODE_SIGNAL).is_none());
        assert_eq!(writer.symbols().len(), 2);
    }

    #[test]
    fn test_record_steps() {
        let model = builtin::buck();
        let mut writer = TraceWriter::new(Vec::new()).with_date("fixed");
        let mut probe = SimulationProbe::register(&model, &mut writer).unwrap();
        writer.begin().unwrap();

        let mut sim = Simulator::float(&model).unwrap();
        let stim = Stimulus::gated(3, 2, SwitchBits(1), vec![6.6, 0.0]);
        probe.run(&mut writer, &mut sim, &stim).unwrap();
        assert_eq!(probe.time(), 3 * model.timestep_ps);

        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        let body: Vec<&str> = text
            .lines()
            .skip_while(|l| *l != "$enddefinitions $end")
            .skip(1)
            .collect();

        // 3 steps x (time marker + 6 values)
        assert_eq!(body.len(), 21);
        assert_eq!(body[0], "#0");
        assert_eq!(body[7], "#250000");
        assert_eq!(body[14], "#500000");
        assert_eq!(body[4], "1 $");
        assert_eq!(body[6], "01 &");
        assert_eq!(body[18], "0 $");
        assert_eq!(body[20], "00 &");
    }
}
