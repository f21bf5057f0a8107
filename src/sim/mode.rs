//! Mode resolution and diode latches.
//!
//! The mode index selects one column of every coefficient table. It is
//! built from two different sources that are kept apart until the lookup:
//! the switch bits supplied by the driver for this step, and the diode
//! latches carried over from the previous step.
//!
//! ```text
//! index = [ D0 D1 ... Dn-1 | S0 S1 ... Sm-1 ]
//!           diode latches     switch bits       (MSB first)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SwitchSimError};
use crate::numeric::Arithmetic;

use super::engine::DiodeQuantities;

/// Switch states for one step, first declared switch in the most
/// significant position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchBits(pub u32);

impl SwitchBits {
    /// All switches open.
    pub const OPEN: SwitchBits = SwitchBits(0);

    /// Pack switch states given in declaration order.
    pub fn from_states(states: &[bool]) -> Self {
        Self(states.iter().fold(0, |bits, &on| (bits << 1) | on as u32))
    }

    /// State of switch `index` out of `count` declared switches.
    pub fn is_on(&self, index: usize, count: usize) -> bool {
        index < count && (self.0 >> (count - 1 - index)) & 1 == 1
    }
}

/// The operating mode used for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode {
    /// Diode latches, first diode most significant.
    pub diodes: u32,
    /// Switch bits as supplied for the step.
    pub switches: SwitchBits,
    switch_count: u32,
}

impl Mode {
    /// Combine latch and switch bits into a table index.
    pub fn index(&self) -> usize {
        ((self.diodes as usize) << self.switch_count) | self.switches.0 as usize
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.index())
    }
}

/// Outcome of one latch evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchTransition {
    TurnedOn,
    TurnedOff,
    Unchanged,
}

/// Apply the latch rule to one diode.
///
/// A conducting diode turns off when its branch current is `<= 0`; a
/// blocking diode turns on when its branch voltage is `> 0`. Zero current
/// therefore switches off while zero voltage does not switch on, which
/// keeps the latch from chattering at the boundary.
pub fn next_latch(on: bool, current_non_positive: bool, voltage_positive: bool) -> (bool, LatchTransition) {
    match (on, current_non_positive, voltage_positive) {
        (true, true, _) => (false, LatchTransition::TurnedOff),
        (false, _, true) => (true, LatchTransition::TurnedOn),
        _ => (on, LatchTransition::Unchanged),
    }
}

#[derive(Debug, Clone)]
struct DiodeLatch {
    name: String,
    on: bool,
}

/// Holds the diode latches and builds mode indices.
#[derive(Debug, Clone)]
pub struct ModeResolver {
    switch_count: usize,
    latches: Vec<DiodeLatch>,
}

impl ModeResolver {
    /// Create a resolver with every diode off.
    pub fn new<S: Into<String>>(switch_count: usize, diode_names: impl IntoIterator<Item = S>) -> Self {
        Self {
            switch_count,
            latches: diode_names
                .into_iter()
                .map(|name| DiodeLatch {
                    name: name.into(),
                    on: false,
                })
                .collect(),
        }
    }

    /// Number of bits in the mode index.
    pub fn mode_bits(&self) -> usize {
        self.latches.len() + self.switch_count
    }

    /// Build the mode for this step from the held latches and the given
    /// switch bits.
    pub fn resolve(&self, switches: SwitchBits) -> Result<Mode> {
        if self.switch_count < 32 && switches.0 >> self.switch_count != 0 {
            return Err(SwitchSimError::SwitchOutOfRange {
                bits: switches.0,
                switch_count: self.switch_count,
            });
        }

        let diodes = self
            .latches
            .iter()
            .fold(0u32, |bits, latch| (bits << 1) | latch.on as u32);

        Ok(Mode {
            diodes,
            switches,
            switch_count: self.switch_count as u32,
        })
    }

    /// Re-evaluate every latch from the branch quantities computed in this
    /// step. The new values only affect the next call to [`resolve`].
    ///
    /// [`resolve`]: ModeResolver::resolve
    pub fn update<A: Arithmetic>(&mut self, arith: &A, quantities: &[DiodeQuantities<A::Value>], step: u64) {
        for (latch, q) in self.latches.iter_mut().zip(quantities) {
            let (on, transition) = next_latch(
                latch.on,
                arith.is_non_positive(q.current),
                arith.is_positive(q.voltage),
            );
            if transition != LatchTransition::Unchanged {
                debug!(diode = %latch.name, on, step, "diode latch changed");
            }
            latch.on = on;
        }
    }

    /// Current latch states in declaration order.
    pub fn latches(&self) -> Vec<bool> {
        self.latches.iter().map(|l| l.on).collect()
    }

    /// Force a latch, mainly for tests and initial conditions.
    pub fn set_latch(&mut self, index: usize, on: bool) {
        if let Some(latch) = self.latches.get_mut(index) {
            latch.on = on;
        }
    }

    /// Turn every diode off.
    pub fn reset(&mut self) {
        for latch in &mut self.latches {
            latch.on = false;
        }
    }
}
