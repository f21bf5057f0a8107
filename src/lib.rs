//! # Switchsim
//!
//! A fixed-timestep simulator for switched piecewise-affine circuit models
//! such as buck converters and RC filters.
//!
//! This library provides:
//! - Mode resolution from switch states and latched ideal-diode states
//! - An affine state update engine driven by per-mode coefficient tables
//! - Fixed-point and double-precision numeric configurations
//! - A dual-precision harness reporting the worst fixed-point deviation
//! - Waveform trace output in the value change dump text format
//!
//! ## Architecture
//!
//! - [`model`] - Model configuration, validation and built-in circuits
//! - [`numeric`] - Fixed-point and floating-point arithmetic
//! - [`sim`] - Mode resolver, affine engine and simulator
//! - [`stimulus`] - Input sequences driving the simulator
//! - [`harness`] - Fixed-point versus reference comparison
//! - [`trace`] - Waveform recording
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! switchsim trace buck --steps 20000 --toggle-every 1000 -o out.vcd
//! switchsim compare buck --steps 256 --lo -400 --hi 400
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use switchsim::{model::builtin, Simulator, Stimulus, SwitchBits};
//!
//! let model = builtin::buck();
//! let mut sim = Simulator::fixed(&model)?;
//! let stimulus = Stimulus::gated(1000, 50, SwitchBits(1), vec![6.6, 0.0]);
//! let steps = sim.run(&stimulus)?;
//! # Ok::<(), switchsim::SwitchSimError>(())
//! ```
//!
//! ## Simulation Method
//!
//! For each time step:
//!
//! 1. Build the mode index from the diode latches and the switch bits
//! 2. Update every state as `const[mode] + sum(gain[mode] * operand)`
//! 3. Evaluate diode branch quantities and outputs from the new state
//! 4. Update the diode latches for the next step
//!
//! A diode decision made in step `n` takes effect in step `n + 1`. This
//! one-step lag is a modelling approximation inherent to fixed-timestep
//! simulation without zero-crossing detection.

pub mod error;
pub mod harness;
pub mod model;
pub mod numeric;
pub mod sim;
pub mod stimulus;
pub mod trace;

// Re-export main types for convenience
pub use error::{Result, SwitchSimError};
pub use harness::{DeviationReport, DualPrecisionHarness};
pub use model::ModelConfig;
pub use sim::{Simulator, SwitchBits};
pub use stimulus::{Stimulus, StimulusSample};
pub use trace::{SimulationProbe, TraceWriter};

/// Default number of steps for CLI runs.
pub const DEFAULT_STEPS: usize = 256;
