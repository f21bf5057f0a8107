//! Waveform trace recording.
//!
//! Traces are written in the value change dump text format so that they
//! open in standard waveform viewers:
//!
//! ```text
//! $date
//!     Mon Jan 01 00:00:00 2024
//! $end
//! $version
//!     switchsim 0.1.0
//! $end
//! $timescale
//!     1ps
//! $end
//! $scope module circuit $end
//! $var real 1 ! v_out $end
//! $var wire 2 " mode [1:0] $end
//! $upscope $end
//! $enddefinitions $end
//! #0
//! r0.165 !
//! 01 "
//! ```
//!
//! Each signal gets a one-character symbol from `!` (33) to `~` (126), so
//! a session holds at most 94 signals.

mod probe;
mod signal;
mod writer;

pub use probe::SimulationProbe;
pub use signal::{
    Signal, SignalKind, SymbolTable, TraceValue, FIRST_SYMBOL, LAST_SYMBOL, MAX_WIRE_WIDTH, SYMBOL_CAPACITY,
};
pub use writer::{TraceWriter, SCOPE, TIMESCALE, VERSION_TAG};
