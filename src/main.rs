//! Switchsim - Switched-Mode Circuit Simulator
//!
//! Runs piecewise-affine circuit models, writes waveform traces and
//! compares fixed-point against double-precision results.
//!
//! # Usage
//!
//! ```bash
//! switchsim trace buck --steps 20000 --toggle-every 1000 --input v_in=6.6 -o out.vcd
//! switchsim compare converter.yaml --steps 256 --toggle-every 10 --lo -400 --hi 400
//! switchsim model buck > buck.yaml
//! ```

use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use switchsim::{
    error::{Result, SwitchSimError},
    model::builtin,
    numeric::Arithmetic,
    DualPrecisionHarness, ModelConfig, SimulationProbe, Simulator, Stimulus, SwitchBits, TraceWriter,
    DEFAULT_STEPS,
};

/// Switched-mode circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate a model and write a waveform trace
    Trace {
        /// Built-in model name or path to a YAML/JSON model
        #[arg(value_name = "MODEL")]
        model: String,

        /// Trace file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stimulus file; replaces the generated gate pattern
        #[arg(long)]
        stimulus: Option<PathBuf>,

        /// Number of steps
        #[arg(long, default_value_t = DEFAULT_STEPS)]
        steps: usize,

        /// Toggle all switches every N steps (0 keeps them open)
        #[arg(long, default_value_t = 0)]
        toggle_every: usize,

        /// Constant input value, e.g. --input v_in=6.6 (others default to 0)
        #[arg(long = "input", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        inputs: Vec<(String, f64)>,

        /// Simulate in the model's fixed-point format instead of f64
        #[arg(long)]
        fixed: bool,
    },

    /// Compare fixed-point against double precision over an input ramp
    Compare {
        /// Built-in model name or path to a YAML/JSON model
        #[arg(value_name = "MODEL")]
        model: String,

        /// Stimulus file; replaces the generated ramp
        #[arg(long)]
        stimulus: Option<PathBuf>,

        /// Number of steps
        #[arg(long, default_value_t = DEFAULT_STEPS)]
        steps: usize,

        /// Toggle all switches every N steps (0 keeps them open)
        #[arg(long, default_value_t = 10)]
        toggle_every: usize,

        /// Start of the ramp on the first input
        #[arg(long, default_value_t = -400.0, allow_negative_numbers = true)]
        lo: f64,

        /// End of the ramp on the first input
        #[arg(long, default_value_t = 400.0, allow_negative_numbers = true)]
        hi: f64,

        /// Output to compare (first output if omitted)
        #[arg(long = "signal")]
        signal: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a built-in model as YAML
    Model {
        /// One of the built-in model names
        name: String,
    },
}

fn parse_assignment(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for '{}': {}", name, e))?;
    Ok((name.trim().to_string(), value))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Resolve a built-in name or load a model file.
fn load_model(name_or_path: &str) -> Result<ModelConfig> {
    match builtin::by_name(name_or_path) {
        Some(model) => Ok(model),
        None => ModelConfig::load(Path::new(name_or_path)),
    }
}

/// Switch bits with every declared switch closed.
fn all_switches(model: &ModelConfig) -> SwitchBits {
    SwitchBits(((1u64 << model.switches.len()) - 1) as u32)
}

fn input_values(model: &ModelConfig, assignments: &[(String, f64)]) -> Result<Vec<f64>> {
    let mut values = vec![0.0; model.inputs.len()];
    for (name, value) in assignments {
        let index = model
            .inputs
            .iter()
            .position(|input| input == name)
            .ok_or_else(|| SwitchSimError::invalid_model(&model.name, format!("no input named '{}'", name)))?;
        values[index] = *value;
    }
    Ok(values)
}

fn write_trace<W: Write, A: Arithmetic>(
    model: &ModelConfig,
    mut sim: Simulator<A>,
    mut writer: TraceWriter<W>,
    stimulus: &Stimulus,
) -> Result<()> {
    let mut probe = SimulationProbe::register(model, &mut writer)?;
    writer.begin()?;
    probe.run(&mut writer, &mut sim, stimulus)?;
    writer.finish()?;
    info!(
        model = %model.name,
        arithmetic = %sim.arithmetic().label(),
        steps = sim.steps(),
        "trace written"
    );
    Ok(())
}

fn run_trace<W: Write>(model: &ModelConfig, writer: TraceWriter<W>, stimulus: &Stimulus, fixed: bool) -> Result<()> {
    if fixed {
        write_trace(model, Simulator::fixed(model)?, writer, stimulus)
    } else {
        write_trace(model, Simulator::float(model)?, writer, stimulus)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Trace {
            model,
            output,
            stimulus,
            steps,
            toggle_every,
            inputs,
            fixed,
        } => {
            let model = load_model(&model)?;
            let stimulus = match stimulus {
                Some(path) => Stimulus::load(&path)?,
                None => Stimulus::gated(steps, toggle_every, all_switches(&model), input_values(&model, &inputs)?),
            };

            match output {
                Some(path) => run_trace(&model, TraceWriter::create(&path)?, &stimulus, fixed)?,
                None => {
                    let stdout = LineWriter::new(io::stdout().lock());
                    run_trace(&model, TraceWriter::new(stdout), &stimulus, fixed)?
                }
            }
        }

        Commands::Compare {
            model,
            stimulus,
            steps,
            toggle_every,
            lo,
            hi,
            signal,
            json,
        } => {
            let model = load_model(&model)?;
            let stimulus = match stimulus {
                Some(path) => Stimulus::load(&path)?,
                None => Stimulus::ramp(steps, lo, hi, toggle_every, all_switches(&model), model.inputs.len()),
            };

            let mut harness = DualPrecisionHarness::new(model)?;
            if let Some(name) = signal {
                harness = harness.with_output(&name)?;
            }
            let report = harness.compare(&stimulus)?;

            if json {
                let text = serde_json::to_string_pretty(&report)
                    .map_err(|e| SwitchSimError::SinkUnavailable { source: e.into() })?;
                println!("{}", text);
            } else {
                println!("{}", report);
            }
        }

        Commands::Model { name } => {
            let model = builtin::by_name(&name).ok_or_else(|| {
                SwitchSimError::invalid_model(
                    &name,
                    format!("unknown built-in model, expected one of {}", builtin::NAMES.join(", ")),
                )
            })?;
            print!("{}", model.to_yaml_string()?);
        }
    }

    Ok(())
}
