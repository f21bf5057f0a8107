//! Signal registry and symbol allocation.

use std::collections::HashMap;

use crate::error::{Result, SwitchSimError};

/// First printable character usable as a waveform symbol (`!`).
pub const FIRST_SYMBOL: u8 = 33;

/// Last printable character usable as a waveform symbol (`~`).
pub const LAST_SYMBOL: u8 = 126;

/// Number of signals one session can hold.
pub const SYMBOL_CAPACITY: usize = (LAST_SYMBOL - FIRST_SYMBOL) as usize + 1;

/// Widest wire value that can be recorded.
pub const MAX_WIRE_WIDTH: u32 = 64;

/// What kind of values a signal carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Real-valued analog quantity.
    Real,
    /// Bit vector of the given width.
    Wire { width: u32 },
}

impl SignalKind {
    fn label(&self) -> &'static str {
        match self {
            SignalKind::Real => "real",
            SignalKind::Wire { .. } => "wire",
        }
    }
}

/// A value to record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceValue {
    Real(f64),
    Bits(u64),
}

impl TraceValue {
    fn label(&self) -> &'static str {
        match self {
            TraceValue::Real(_) => "real",
            TraceValue::Bits(_) => "wire",
        }
    }
}

impl From<f64> for TraceValue {
    fn from(value: f64) -> Self {
        TraceValue::Real(value)
    }
}

impl From<bool> for TraceValue {
    fn from(value: bool) -> Self {
        TraceValue::Bits(value as u64)
    }
}

/// A registered signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: String,
    pub symbol: char,
    pub kind: SignalKind,
}

impl Signal {
    /// Render the declaration line for the header.
    pub fn declaration(&self) -> String {
        match self.kind {
            SignalKind::Real => format!("$var real 1 {} {} $end", self.symbol, self.name),
            SignalKind::Wire { width: 1 } => format!("$var wire 1 {} {} $end", self.symbol, self.name),
            SignalKind::Wire { width } => format!(
                "$var wire {} {} {} [{}:0] $end",
                width,
                self.symbol,
                self.name,
                width - 1
            ),
        }
    }

    /// Render a value line, checking the value against the declaration.
    ///
    /// Reals use the shortest positional decimal that reads back to the
    /// same f64 (`r0.165`, `r0.0000001`) and must be finite. Wire values
    /// must fit the declared width and are zero-padded to it.
    pub fn value_line(&self, value: TraceValue) -> Result<String> {
        match (self.kind, value) {
            (SignalKind::Real, TraceValue::Real(v)) => {
                if !v.is_finite() {
                    return Err(SwitchSimError::session(format!(
                        "signal '{}' cannot record non-finite value {}",
                        self.name, v
                    )));
                }
                Ok(format!("r{} {}", v, self.symbol))
            }
            (SignalKind::Wire { width }, TraceValue::Bits(bits)) => {
                if width < 64 && bits >> width != 0 {
                    return Err(SwitchSimError::session(format!(
                        "value {:#b} does not fit {}-bit wire '{}'",
                        bits, width, self.name
                    )));
                }
                Ok(format!("{:0width$b} {}", bits, self.symbol, width = width as usize))
            }
            (kind, value) => Err(SwitchSimError::SignalKindMismatch {
                name: self.name.clone(),
                declared: kind.label(),
                recorded: value.label(),
            }),
        }
    }
}

/// Append-only map from signal names to allocated symbols.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    signals: Vec<Signal>,
    by_name: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a signal and allocate the next symbol.
    pub fn register(&mut self, name: &str, kind: SignalKind) -> Result<char> {
        if self.by_name.contains_key(name) {
            return Err(SwitchSimError::session(format!("signal '{}' is already registered", name)));
        }
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(SwitchSimError::session(format!("'{}' is not a valid signal name", name)));
        }
        if let SignalKind::Wire { width } = kind {
            if width == 0 || width > MAX_WIRE_WIDTH {
                return Err(SwitchSimError::session(format!(
                    "wire '{}' has width {}, expected 1..={}",
                    name, width, MAX_WIRE_WIDTH
                )));
            }
        }
        if self.signals.len() >= SYMBOL_CAPACITY {
            return Err(SwitchSimError::SymbolExhausted {
                name: name.to_string(),
                capacity: SYMBOL_CAPACITY,
            });
        }

        let symbol = (FIRST_SYMBOL + self.signals.len() as u8) as char;
        self.by_name.insert(name.to_string(), self.signals.len());
        self.signals.push(Signal {
            name: name.to_string(),
            symbol,
            kind,
        });
        Ok(symbol)
    }

    /// Look up a signal by name.
    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.by_name.get(name).map(|&i| &self.signals[i])
    }

    /// Signals in registration order.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_symbols_increase_from_bang() {
        let mut table = SymbolTable::new();
        assert_eq!(table.register("a", SignalKind::Real).unwrap(), '!');
        assert_eq!(table.register("b", SignalKind::Real).unwrap(), '"');
        assert_eq!(table.register("c", SignalKind::Wire { width: 1 }).unwrap(), '#');
        assert_eq!(table.get("b").map(|s| s.symbol), Some('"'));
    }

    #[test]
    fn test_ninety_fifth_registration_fails() {
        let mut table = SymbolTable::new();
        for k in 0..SYMBOL_CAPACITY {
            let symbol = table.register(&format!("s{}", k), SignalKind::Real).unwrap();
            assert_eq!(symbol as u32, 33 + k as u32);
        }
        assert_eq!(table.signals().last().map(|s| s.symbol), Some('~'));
        let err = table.register("overflow", SignalKind::Real).unwrap_err();
        assert!(matches!(err, SwitchSimError::SymbolExhausted { capacity: 94, .. }));
        assert_eq!(table.len(), SYMBOL_CAPACITY);
    }

    #[test]
    fn test_duplicate_and_invalid_names() {
        let mut table = SymbolTable::new();
        table.register("v_out", SignalKind::Real).unwrap();
        assert!(table.register("v_out", SignalKind::Real).is_err());
        assert!(table.register("two words", SignalKind::Real).is_err());
        assert!(table.register("w", SignalKind::Wire { width: 0 }).is_err());
        assert!(table.register("w", SignalKind::Wire { width: 65 }).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_declarations() {
        let real = Signal {
            name: "v_out".to_string(),
            symbol: '!',
            kind: SignalKind::Real,
        };
        let bus = Signal {
            name: "sel".to_string(),
            symbol: '"',
            kind: SignalKind::Wire { width: 2 },
        };
        assert_eq!(real.declaration(), "$var real 1 ! v_out $end");
        assert_eq!(bus.declaration(), "$var wire 2 \" sel [1:0] $end");
    }

    #[test]
    fn test_value_lines() {
        let bus = Signal {
            name: "sel".to_string(),
            symbol: '"',
            kind: SignalKind::Wire { width: 4 },
        };
        assert_eq!(bus.value_line(TraceValue::Bits(0b10)).unwrap(), "0010 \"");
        assert_eq!(bus.value_line(TraceValue::Bits(0xf)).unwrap(), "1111 \"");
        assert!(matches!(
            bus.value_line(TraceValue::Bits(0x1f)),
            Err(SwitchSimError::SessionState { .. })
        ));
        assert!(matches!(
            bus.value_line(TraceValue::Real(1.0)),
            Err(SwitchSimError::SignalKindMismatch { .. })
        ));
    }

    #[test]
    fn test_real_values_must_be_finite() {
        let v = Signal {
            name: "v_out".to_string(),
            symbol: '!',
            kind: SignalKind::Real,
        };
        assert_eq!(v.value_line(TraceValue::Real(1e-7)).unwrap(), "r0.0000001 !");
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert!(matches!(
                v.value_line(TraceValue::Real(bad)),
                Err(SwitchSimError::SessionState { .. })
            ));
        }
    }

    proptest! {
        #[test]
        fn symbols_are_distinct_printable(count in 1usize..=SYMBOL_CAPACITY) {
            let mut table = SymbolTable::new();
            for k in 0..count {
                table.register(&format!("sig{}", k), SignalKind::Real).unwrap();
            }
            let symbols: Vec<char> = table.signals().iter().map(|s| s.symbol).collect();
            for pair in symbols.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            prop_assert!(symbols.iter().all(|c| c.is_ascii_graphic()));
        }
    }
}
