//! Whole-pipeline checks: model file to simulator to trace file.

use switchsim::model::{builtin, AffineDef, OutputDef, StateDef, UpdateOrder};
use switchsim::numeric::FixedFormat;
use switchsim::{
    DualPrecisionHarness, ModelConfig, SimulationProbe, Simulator, Stimulus, StimulusSample, SwitchBits,
    SwitchSimError, TraceWriter,
};

fn integrator() -> ModelConfig {
    ModelConfig {
        name: "integrator".to_string(),
        timestep_ps: 2000,
        format: FixedFormat {
            total_bits: 25,
            frac_bits: 13,
        },
        update_order: UpdateOrder::Sequential,
        inputs: vec!["u".to_string()],
        switches: vec!["S0".to_string(), "S1".to_string()],
        states: vec![StateDef {
            name: "x".to_string(),
            initial: 0.0,
            update: AffineDef::default()
                .with_gain("x", vec![0.0, 1.0, 1.0, 0.0])
                .with_gain("u", vec![0.0, 0.025, 0.0, 0.0]),
        }],
        diodes: Vec::new(),
        outputs: vec![OutputDef {
            name: "x_out".to_string(),
            expr: AffineDef::default().with_gain("x", vec![1.0, 1.0, 1.0, 1.0]),
        }],
    }
}

#[test]
fn integrator_five_steps() {
    let model = integrator();
    // S0 open, S1 closed: mode 1 on every step
    let stim = Stimulus::new(vec![StimulusSample::new(SwitchBits(1), vec![6.6]); 5]);

    let reference = Simulator::float(&model).unwrap().run(&stim).unwrap();
    let dut = Simulator::fixed(&model).unwrap().run(&stim).unwrap();

    for (n, (r, d)) in reference.iter().zip(&dut).enumerate() {
        let expected = 0.165 * (n + 1) as f64;
        assert_eq!(r.mode.index(), 1);
        assert!((r.outputs[0] - expected).abs() < 1e-12);
        // gain and input each lose under one lsb to truncation
        assert!((d.outputs[0] - expected).abs() < 0.002 * (n + 1) as f64);
    }
}

#[test]
fn model_file_to_trace_file() {
    let dir = std::env::temp_dir().join(format!("switchsim-e2e-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let model_path = dir.join("buck.yaml");
    let trace_path = dir.join("buck.vcd");

    std::fs::write(&model_path, builtin::buck().to_yaml_string().unwrap()).unwrap();
    let model = ModelConfig::load(&model_path).unwrap();
    assert_eq!(model, builtin::buck());

    let mut writer = TraceWriter::create(&trace_path).unwrap();
    let mut probe = SimulationProbe::register(&model, &mut writer).unwrap();
    writer.begin().unwrap();
    let mut sim = Simulator::fixed(&model).unwrap();
    let stim = Stimulus::gated(100, 10, SwitchBits(1), vec![6.6, 0.0]);
    let steps = probe.run(&mut writer, &mut sim, &stim).unwrap();
    writer.finish().unwrap();

    assert_eq!(steps.len(), 100);
    let text = std::fs::read_to_string(&trace_path).unwrap();
    assert!(text.contains("$timescale\n\t1ps\n$end"));
    assert!(text.contains("$scope module circuit $end"));
    assert!(text.contains("$var real 1 ! v_out $end"));
    assert!(text.contains("$var wire 2 & mode [1:0] $end"));
    assert!(text.lines().any(|l| l == "#0"));
    assert!(text.lines().any(|l| l == "#24750000"));
    assert_eq!(text.lines().filter(|l| l.starts_with('#')).count(), 100);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn buck_ramp_comparison() {
    let harness = DualPrecisionHarness::new(builtin::buck()).unwrap();
    let stim = Stimulus::ramp(256, -400.0, 400.0, 10, SwitchBits(1), 2);
    let report = harness.compare(&stim).unwrap();

    assert_eq!(report.samples, 256);
    assert!(report.max_absolute_deviation >= 0.0);
    assert!(report.max_relative_deviation >= 0.0);
    assert!(report.max_absolute_deviation.is_finite());
}

#[test]
fn invalid_model_file_rejected() {
    let err = ModelConfig::from_yaml_str("name: broken\nformat: {total_bits: 25, frac_bits: 13}\nstates: []\noutputs: []\n")
        .unwrap_err();
    assert!(matches!(err, SwitchSimError::InvalidModel { .. }));
}
