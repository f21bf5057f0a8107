//! Line-oriented waveform writer.

use std::fs::File;
use std::io::{LineWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, SwitchSimError};

use super::signal::{SignalKind, SymbolTable, TraceValue};

/// Version tag written to every header.
pub const VERSION_TAG: &str = concat!("switchsim ", env!("CARGO_PKG_VERSION"));

/// Timescale of every session: one time unit is one picosecond.
pub const TIMESCALE: &str = "1ps";

/// Scope that contains every signal.
pub const SCOPE: &str = "circuit";

/// Date format of the header, as written by common HDL simulators.
const DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Signals may still be registered; nothing written yet.
    Registering,
    /// Header written, no time marker yet.
    Declared,
    /// At least one time marker written.
    Recording,
}

/// A waveform session writing to `W`.
///
/// Usage follows a fixed order: register every signal, call
/// [`begin`](TraceWriter::begin) once to write the header, then for each
/// step call [`advance_time`](TraceWriter::advance_time) followed by any
/// number of [`record`](TraceWriter::record) calls.
///
/// Every call writes straight through to the sink. The sink is dropped
/// (and a file closed) with the writer, whichever way the session ends.
pub struct TraceWriter<W: Write> {
    sink: W,
    symbols: SymbolTable,
    date: Option<String>,
    version: String,
    phase: Phase,
    time: u64,
}

impl TraceWriter<LineWriter<File>> {
    /// Create (or truncate) a trace file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| SwitchSimError::SinkUnavailable { source })?;
        debug!(path = %path.display(), "opened waveform file");
        Ok(Self::new(LineWriter::new(file)))
    }
}

impl<W: Write> TraceWriter<W> {
    /// Start a session on an already open sink.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            symbols: SymbolTable::new(),
            date: None,
            version: VERSION_TAG.to_string(),
            phase: Phase::Registering,
            time: 0,
        }
    }

    /// Use a fixed header date instead of the current local time.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Override the header version tag.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Register a signal, returning its symbol. Must precede
    /// [`begin`](TraceWriter::begin).
    pub fn register(&mut self, name: &str, kind: SignalKind) -> Result<char> {
        if self.phase != Phase::Registering {
            return Err(SwitchSimError::session(format!(
                "cannot register '{}' after the header is written",
                name
            )));
        }
        self.symbols.register(name, kind)
    }

    /// Register a real-valued signal.
    pub fn register_real(&mut self, name: &str) -> Result<char> {
        self.register(name, SignalKind::Real)
    }

    /// Register a bit-vector signal.
    pub fn register_wire(&mut self, name: &str, width: u32) -> Result<char> {
        self.register(name, SignalKind::Wire { width })
    }

    /// Symbol allocated to `name`.
    pub fn symbol(&self, name: &str) -> Option<char> {
        self.symbols.get(name).map(|s| s.symbol)
    }

    /// The signal registry.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Current simulated time.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Write the header and the signal declarations.
    pub fn begin(&mut self) -> Result<()> {
        if self.phase != Phase::Registering {
            return Err(SwitchSimError::session("header already written"));
        }

        let date = self
            .date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format(DATE_FORMAT).to_string());

        writeln!(self.sink, "$date")?;
        writeln!(self.sink, "\t{}", date)?;
        writeln!(self.sink, "$end")?;
        writeln!(self.sink, "$version")?;
        writeln!(self.sink, "\t{}", self.version)?;
        writeln!(self.sink, "$end")?;
        writeln!(self.sink, "$timescale")?;
        writeln!(self.sink, "\t{}", TIMESCALE)?;
        writeln!(self.sink, "$end")?;

        writeln!(self.sink, "$scope module {} $end", SCOPE)?;
        for signal in self.symbols.signals() {
            writeln!(self.sink, "{}", signal.declaration())?;
        }
        writeln!(self.sink, "$upscope $end")?;
        writeln!(self.sink, "$enddefinitions $end")?;

        self.phase = Phase::Declared;
        info!(signals = self.symbols.len(), "waveform header written");
        Ok(())
    }

    /// Move to simulated time `time` (picoseconds) and write its marker.
    ///
    /// Time may stay the same but never decrease. Repeating the current
    /// time does not write a second marker.
    pub fn advance_time(&mut self, time: u64) -> Result<()> {
        match self.phase {
            Phase::Registering => Err(SwitchSimError::session("time advanced before the header was written")),
            Phase::Recording if time < self.time => Err(SwitchSimError::TimeReversal {
                current: self.time,
                requested: time,
            }),
            Phase::Recording if time == self.time => Ok(()),
            _ => {
                writeln!(self.sink, "#{}", time)?;
                self.time = time;
                self.phase = Phase::Recording;
                Ok(())
            }
        }
    }

    /// Write one value for the current time.
    pub fn record(&mut self, name: &str, value: impl Into<TraceValue>) -> Result<()> {
        if self.phase != Phase::Recording {
            return Err(SwitchSimError::session(format!(
                "value for '{}' recorded before any time marker",
                name
            )));
        }
        let signal = self.symbols.get(name).ok_or_else(|| SwitchSimError::UnknownSignal {
            name: name.to_string(),
        })?;
        let line = signal.value_line(value.into())?;
        writeln!(self.sink, "{}", line)?;
        Ok(())
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.sink.flush()?;
        debug!(time = self.time, "waveform session finished");
        Ok(self.sink)
    }
}
