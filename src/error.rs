//! Error types for the switched-mode simulator.
//!
//! This module provides a unified error type [`SwitchSimError`] that covers
//! model configuration, simulation, precision comparison and waveform
//! output.

use thiserror::Error;

/// Result type alias using [`SwitchSimError`].
pub type Result<T> = std::result::Result<T, SwitchSimError>;

/// Unified error type for all simulator operations.
#[derive(Error, Debug)]
pub enum SwitchSimError {
    // ============ Model Configuration Errors ============
    /// Structurally invalid model
    #[error("Invalid model '{model}': {message}")]
    InvalidModel { model: String, message: String },

    /// Two states, inputs, switches, diodes or outputs share a name
    #[error("Duplicate name '{name}' in model '{model}'")]
    DuplicateName { model: String, name: String },

    /// A gain refers to something that is neither a state nor an input
    #[error("Coefficient row '{row}' references unknown state or input '{operand}'")]
    UnknownOperand { row: String, operand: String },

    /// A coefficient table does not have one entry per mode
    #[error("Coefficient table '{table}' has {found} entries, expected {expected} (one per mode)")]
    TableLength {
        table: String,
        expected: usize,
        found: usize,
    },

    /// Unusable fixed-point format
    #[error("Invalid fixed-point format: {total_bits} total bits, {frac_bits} fractional bits")]
    InvalidFormat { total_bits: u32, frac_bits: u32 },

    /// Error parsing a model document
    #[error("Failed to parse model: {message}")]
    ModelParse { message: String },

    /// Error parsing a stimulus document
    #[error("Failed to parse stimulus: {message}")]
    StimulusParse { message: String },

    // ============ Simulation Errors ============
    /// Wrong number of input values for a step
    #[error("Model expects {expected} input values, got {found}")]
    InputCount { expected: usize, found: usize },

    /// Switch bits set above the declared switch count
    #[error("Switch bits {bits:#b} do not fit in {switch_count} declared switches")]
    SwitchOutOfRange { bits: u32, switch_count: usize },

    // ============ Dual-Precision Comparison Errors ============
    /// Reference and fixed-point sequences differ in length
    #[error("Number of results differs between reference ({reference}) and fixed-point ({dut}) runs")]
    LengthMismatch { reference: usize, dut: usize },

    /// Relative deviation requested against a zero fixed-point sample
    #[error("Relative deviation undefined: fixed-point sample {index} is zero")]
    DivisionByZero { index: usize },

    // ============ Trace Errors ============
    /// More signals registered than there are printable symbols
    #[error("Cannot register signal '{name}': all {capacity} waveform symbols are in use")]
    SymbolExhausted { name: String, capacity: usize },

    /// Value recorded for a signal that was never registered
    #[error("Signal '{name}' is not registered in this trace session")]
    UnknownSignal { name: String },

    /// Real value recorded for a wire signal or vice versa
    #[error("Signal '{name}' is declared as {declared}, cannot record a {recorded} value")]
    SignalKindMismatch {
        name: String,
        declared: &'static str,
        recorded: &'static str,
    },

    /// Time moved backwards
    #[error("Trace time cannot decrease from {current} to {requested}")]
    TimeReversal { current: u64, requested: u64 },

    /// Operation not allowed in the current session phase
    #[error("Trace session error: {message}")]
    SessionState { message: String },

    /// Output sink could not be opened or written
    #[error("Waveform sink unavailable: {source}")]
    SinkUnavailable {
        #[source]
        source: std::io::Error,
    },

    // ============ I/O Errors ============
    /// Error reading a model or stimulus file
    #[error("Failed to read file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SwitchSimError {
    /// Create an invalid model error
    pub fn invalid_model(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidModel {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Create a table length error
    pub fn table_length(table: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::TableLength {
            table: table.into(),
            expected,
            found,
        }
    }

    /// Create a session state error
    pub fn session(message: impl Into<String>) -> Self {
        Self::SessionState {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for SwitchSimError {
    fn from(source: std::io::Error) -> Self {
        Self::SinkUnavailable { source }
    }
}
