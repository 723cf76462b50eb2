//! A backend that drives no hardware at all.
//!
//! [`SimBackend`] implements the full electrical contract against in-memory
//! state and hands out a [`SimProbe`] so tests and demos can observe what the
//! refresh loop did after the backend has moved into the engine thread. It
//! claims hardware pulsing, which makes simulated refresh cycles run at full
//! speed instead of sleeping out the bit-plane on-times.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::gpio::{DataWord, GpioBackend};
use crate::options::MatrixOptions;

/// Electrical activity recorded by a [`SimBackend`].
#[derive(Debug, Default)]
pub struct SimTrace {
    pub claims: u32,
    pub releases: u32,
    pub shifts: u64,
    pub latches: u64,
    pub pulses: u64,
    pub pulse_nanos: u64,
    /// Accumulated on-time in nanoseconds of the first chain's red line,
    /// keyed by (row address, column).
    pub red_on_time: HashMap<(u8, usize), u64>,
    /// How often each address appeared on the address lines. Counters, not
    /// a log: the trace stays bounded however long the refresh loop runs.
    pub address_counts: HashMap<u8, u64>,
}

/// Shared view into a [`SimBackend`]'s trace.
#[derive(Clone)]
pub struct SimProbe(Arc<Mutex<SimTrace>>);

impl SimProbe {
    /// Run `f` against the current trace.
    pub fn with<R>(&self, f: impl FnOnce(&SimTrace) -> R) -> R {
        f(&self.0.lock().unwrap())
    }
}

pub struct SimBackend {
    trace: Arc<Mutex<SimTrace>>,
    columns: usize,
    shift_register: Vec<DataWord>,
    latched: Vec<DataWord>,
    address: u8,
    latch: bool,
    blanked: bool,
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBackend {
    pub fn new() -> Self {
        Self {
            trace: Arc::new(Mutex::new(SimTrace::default())),
            columns: 0,
            shift_register: Vec::new(),
            latched: Vec::new(),
            address: 0,
            latch: false,
            blanked: true,
        }
    }

    pub fn probe(&self) -> SimProbe {
        SimProbe(Arc::clone(&self.trace))
    }
}

impl GpioBackend for SimBackend {
    fn claim(&mut self, options: &MatrixOptions) -> Result<(), Error> {
        self.columns = options.matrix_width();
        self.trace.lock().unwrap().claims += 1;
        Ok(())
    }

    fn shift(&mut self, word: DataWord) {
        self.shift_register.push(word);
        let len = self.shift_register.len();
        if len > self.columns {
            self.shift_register.drain(..len - self.columns);
        }
        if self.latch {
            // latch held open: data falls through, as on real panels
            self.latched = self.shift_register.clone();
        }
        self.trace.lock().unwrap().shifts += 1;
    }

    fn set_latch(&mut self, state: bool) {
        if state && !self.latch {
            self.latched = self.shift_register.clone();
            self.trace.lock().unwrap().latches += 1;
        }
        self.latch = state;
    }

    fn set_address(&mut self, addr: u8) {
        self.address = addr;
        *self
            .trace
            .lock()
            .unwrap()
            .address_counts
            .entry(addr)
            .or_default() += 1;
    }

    fn blank(&mut self, state: bool) {
        self.blanked = state;
    }

    fn hardware_pulse(&mut self, ns: u64) -> bool {
        let mut trace = self.trace.lock().unwrap();
        trace.pulses += 1;
        trace.pulse_nanos += ns;
        for (col, word) in self.latched.iter().enumerate() {
            let (r, _, _) = word.color0(0);
            if r {
                *trace.red_on_time.entry((self.address, col)).or_default() += ns;
            }
        }
        true
    }

    fn release(&mut self) {
        self.trace.lock().unwrap().releases += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_captures_last_row_of_columns() {
        let mut backend = SimBackend::new();
        backend
            .claim(&MatrixOptions {
                cols: 8,
                ..MatrixOptions::default()
            })
            .unwrap();
        for i in 0..10u32 {
            let mut word = DataWord::new();
            word.set_color0(0, i >= 2, false, false);
            backend.shift(word);
        }
        backend.set_latch(true);
        backend.set_latch(false);
        backend.set_address(1);
        assert!(backend.hardware_pulse(100));
        let probe = backend.probe();
        probe.with(|trace| {
            assert_eq!(trace.shifts, 10);
            assert_eq!(trace.latches, 1);
            // all 8 retained columns had the red bit set
            assert_eq!(trace.red_on_time.len(), 8);
            assert_eq!(trace.red_on_time[&(1, 0)], 100);
            assert_eq!(trace.address_counts[&1], 1);
        });
    }
}
