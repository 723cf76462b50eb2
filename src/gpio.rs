//! The hardware seam. Everything above this module is backend-agnostic;
//! implement [`GpioBackend`] to bring the engine to a new board.

use bitfield::bitfield;
use embedded_hal::digital::OutputPin;

use crate::error::Error;
use crate::options::MatrixOptions;

bitfield! {
    /// One clock edge worth of HUB75 data-line state.
    ///
    /// Bits 0-5 are the six color lines of the first parallel chain: red,
    /// green and blue for the top sub-pixel (`red1`..`blu1`) and for the
    /// bottom sub-pixel (`red2`..`blu2`). Chains two and three occupy the
    /// same layout at bits 6-11 and 12-17.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct DataWord(u32);
    impl Debug;
    pub red1, set_red1: 0;
    pub grn1, set_grn1: 1;
    pub blu1, set_blu1: 2;
    pub red2, set_red2: 3;
    pub grn2, set_grn2: 4;
    pub blu2, set_blu2: 5;
}

impl DataWord {
    const LANE_BITS: usize = 6;

    pub const fn new() -> Self {
        Self(0)
    }

    fn set_lane_bit(&mut self, lane: usize, offset: usize, on: bool) {
        let bit = lane * Self::LANE_BITS + offset;
        if on {
            self.0 |= 1 << bit;
        } else {
            self.0 &= !(1 << bit);
        }
    }

    fn lane_bit(&self, lane: usize, offset: usize) -> bool {
        self.0 & (1 << (lane * Self::LANE_BITS + offset)) != 0
    }

    /// Set the top sub-pixel color bits of a parallel chain.
    pub fn set_color0(&mut self, lane: usize, r: bool, g: bool, b: bool) {
        self.set_lane_bit(lane, 0, r);
        self.set_lane_bit(lane, 1, g);
        self.set_lane_bit(lane, 2, b);
    }

    /// Set the bottom sub-pixel color bits of a parallel chain.
    pub fn set_color1(&mut self, lane: usize, r: bool, g: bool, b: bool) {
        self.set_lane_bit(lane, 3, r);
        self.set_lane_bit(lane, 4, g);
        self.set_lane_bit(lane, 5, b);
    }

    pub fn color0(&self, lane: usize) -> (bool, bool, bool) {
        (
            self.lane_bit(lane, 0),
            self.lane_bit(lane, 1),
            self.lane_bit(lane, 2),
        )
    }

    pub fn color1(&self, lane: usize) -> (bool, bool, bool) {
        (
            self.lane_bit(lane, 3),
            self.lane_bit(lane, 4),
            self.lane_bit(lane, 5),
        )
    }
}

/// Electrical interface to a HUB75 connector.
///
/// The refresh loop shifts a row of [`DataWord`]s, blanks the display,
/// latches, selects the row address and re-enables output for the bit-plane's
/// on-time. Implementations own the only hardware-touching state in the
/// system and are driven from the background refresh thread.
pub trait GpioBackend: Send {
    /// Claim the hardware for the given configuration. Called once, before
    /// any other method; failing here aborts matrix construction.
    fn claim(&mut self, options: &MatrixOptions) -> Result<(), Error> {
        let _ = options;
        Ok(())
    }

    /// Set the data lines to `word` and pulse the clock.
    fn shift(&mut self, word: DataWord);

    /// Drive the latch line. The engine pulses it high/low after a row has
    /// been shifted; panel init sequences may hold it across several clocks.
    fn set_latch(&mut self, state: bool);

    /// Present `addr` on the row address lines.
    fn set_address(&mut self, addr: u8);

    /// Blank (true) or enable (false) the panel output.
    fn blank(&mut self, state: bool);

    /// Produce a hardware-timed output-enable pulse of `ns` nanoseconds.
    /// Return false if the backend has no pulse hardware; the engine then
    /// times the pulse in software.
    fn hardware_pulse(&mut self, ns: u64) -> bool {
        let _ = ns;
        false
    }

    /// Release the hardware. Called exactly once when the matrix shuts
    /// down, regardless of prior errors.
    fn release(&mut self) {}
}

/// The GPIO pins of one HUB75 connector.
pub struct Hub75Pins<P: OutputPin> {
    pub red1: P,
    pub grn1: P,
    pub blu1: P,
    pub red2: P,
    pub grn2: P,
    pub blu2: P,
    pub addr0: P,
    pub addr1: P,
    pub addr2: P,
    pub addr3: P,
    pub addr4: P,
    pub blank: P,
    pub clock: P,
    pub latch: P,
}

/// Color pins for an additional parallel chain sharing the control lines.
pub struct LanePins<P: OutputPin> {
    pub red1: P,
    pub grn1: P,
    pub blu1: P,
    pub red2: P,
    pub grn2: P,
    pub blu2: P,
}

/// Bit-banged [`GpioBackend`] over `embedded-hal` output pins.
///
/// Works with any HAL that hands out `OutputPin`s. The pin writes themselves
/// set the pace; `gpio_slowdown` repeats the clock edges for boards that
/// toggle faster than the panel's shift registers can follow.
pub struct PinBackend<P: OutputPin + Send> {
    pins: Hub75Pins<P>,
    lanes: Vec<LanePins<P>>,
    slowdown: u32,
}

impl<P: OutputPin + Send> PinBackend<P> {
    pub fn new(pins: Hub75Pins<P>) -> Self {
        Self {
            pins,
            lanes: Vec::new(),
            slowdown: 1,
        }
    }

    /// Add color pins for one more parallel chain (up to two extra).
    pub fn with_lane(mut self, lane: LanePins<P>) -> Self {
        self.lanes.push(lane);
        self
    }
}

impl<P: OutputPin + Send> GpioBackend for PinBackend<P> {
    fn claim(&mut self, options: &MatrixOptions) -> Result<(), Error> {
        if options.parallel > 1 + self.lanes.len() {
            return Err(Error::Init(format!(
                "{} parallel chains configured but pins for {} connected",
                options.parallel,
                1 + self.lanes.len()
            )));
        }
        self.slowdown = options.gpio_slowdown;
        Ok(())
    }

    fn shift(&mut self, word: DataWord) {
        self.pins.red1.set_state(word.red1().into()).unwrap();
        self.pins.grn1.set_state(word.grn1().into()).unwrap();
        self.pins.blu1.set_state(word.blu1().into()).unwrap();
        self.pins.red2.set_state(word.red2().into()).unwrap();
        self.pins.grn2.set_state(word.grn2().into()).unwrap();
        self.pins.blu2.set_state(word.blu2().into()).unwrap();
        for (i, lane) in self.lanes.iter_mut().enumerate() {
            let (r, g, b) = word.color0(i + 1);
            lane.red1.set_state(r.into()).unwrap();
            lane.grn1.set_state(g.into()).unwrap();
            lane.blu1.set_state(b.into()).unwrap();
            let (r, g, b) = word.color1(i + 1);
            lane.red2.set_state(r.into()).unwrap();
            lane.grn2.set_state(g.into()).unwrap();
            lane.blu2.set_state(b.into()).unwrap();
        }
        for _ in 0..self.slowdown {
            self.pins.clock.set_high().unwrap();
        }
        for _ in 0..self.slowdown {
            self.pins.clock.set_low().unwrap();
        }
    }

    fn set_latch(&mut self, state: bool) {
        self.pins.latch.set_state(state.into()).unwrap();
    }

    fn set_address(&mut self, addr: u8) {
        self.pins.addr0.set_state(((addr & 1) != 0).into()).unwrap();
        self.pins.addr1.set_state(((addr & 2) != 0).into()).unwrap();
        self.pins.addr2.set_state(((addr & 4) != 0).into()).unwrap();
        self.pins.addr3.set_state(((addr & 8) != 0).into()).unwrap();
        self.pins.addr4.set_state(((addr & 16) != 0).into()).unwrap();
    }

    fn blank(&mut self, state: bool) {
        self.pins.blank.set_state(state.into()).unwrap();
    }
}
