//! Switched-mode affine simulation.
//!
//! Each step runs the same sequence:
//!
//! 1. [`ModeResolver`] builds the mode index from the diode latches left by
//!    the previous step and the switch bits supplied for this one
//! 2. [`AffineEngine`] applies that mode's coefficients to advance the
//!    state, then evaluates diode branch quantities and outputs
//! 3. [`ModeResolver`] re-evaluates the latches from the branch quantities,
//!    for use by the next step
//!
//! The [`Simulator`] ties the two together and owns all persistent state.

mod engine;
mod mode;
mod simulator;

pub use engine::{AffineEngine, DiodeQuantities, StepResult};
pub use mode::{next_latch, LatchTransition, Mode, ModeResolver, SwitchBits};
pub use simulator::{Simulator, StepOutput};
