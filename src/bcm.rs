//! Binary-code-modulation scheduling.
//!
//! Converts an RGB frame into an ordered sequence of bit-plane slots, each a
//! row of [`DataWord`]s plus the address and plane it belongs to. Plane `k`
//! is displayed for `pwm_lsb_nanoseconds << k`, scaled by the current
//! brightness; low planes can be time-dithered across refresh cycles. This
//! module is pure computation, no I/O.

use crate::canvas::FrameBuffer;
use crate::gpio::DataWord;
use crate::mapper::MapperChain;
use crate::options::MatrixOptions;
use crate::panel;

/// One shift-and-display step: the column words of a single bit plane for a
/// single scan row.
pub(crate) struct Slot {
    pub addr: u8,
    pub plane: u8,
    pub words: Vec<DataWord>,
}

/// A full refresh cycle worth of slots, in drive order.
pub(crate) struct Schedule {
    pub slots: Vec<Slot>,
    lsb_ns: u64,
    dither_bits: u8,
}

impl Schedule {
    /// Lay out empty slots for the configured geometry: one per
    /// (scan row, bit plane), rows ordered per multiplexing and scan mode.
    pub(crate) fn empty(options: &MatrixOptions) -> Self {
        let width = options.matrix_width();
        let sequence = panel::row_sequence(
            options.multiplexing,
            options.scan_mode,
            options.scan_rows(),
        );
        let mut slots = Vec::with_capacity(sequence.len() * options.pwm_bits as usize);
        for &row in &sequence {
            for plane in 0..options.pwm_bits {
                slots.push(Slot {
                    addr: panel::encode_row_address(options.row_address_type, row),
                    plane,
                    words: vec![DataWord::new(); width],
                });
            }
        }
        Self {
            slots,
            lsb_ns: options.pwm_lsb_nanoseconds as u64,
            dither_bits: options.pwm_dither_bits,
        }
    }

    /// Rebuild the slot words from `frame`. `frame` has the mapper chain's
    /// visible dimensions; `order` is the wiring order of the color lines.
    pub(crate) fn render(
        &mut self,
        frame: &FrameBuffer,
        options: &MatrixOptions,
        chain: &MapperChain,
        order: [usize; 3],
    ) {
        let rows = options.rows;
        let scan_rows = options.scan_rows();
        let pwm_bits = options.pwm_bits;

        // position of each scan row in the drive order
        let mut row_pos = vec![0usize; scan_rows];
        let sequence = panel::row_sequence(options.multiplexing, options.scan_mode, scan_rows);
        for (i, &row) in sequence.iter().enumerate() {
            row_pos[row as usize] = i;
        }

        for slot in &mut self.slots {
            slot.words.iter_mut().for_each(|w| *w = DataWord::new());
        }

        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let color = frame.at(x, y);
                let (mx, my) = chain.map(x, y);
                let lane = my / rows;
                let row_in_lane = my % rows;
                let scan = row_in_lane % scan_rows;
                let top_half = row_in_lane < scan_rows;

                let channels = line_values(color, order, options.inverse_colors);
                let scaled = channels.map(|v| scale_channel(v, pwm_bits));

                let base = row_pos[scan] * pwm_bits as usize;
                for plane in 0..pwm_bits {
                    let r = scaled[0] >> plane & 1 != 0;
                    let g = scaled[1] >> plane & 1 != 0;
                    let b = scaled[2] >> plane & 1 != 0;
                    if !(r || g || b) {
                        continue;
                    }
                    let word = &mut self.slots[base + plane as usize].words[mx];
                    if top_half {
                        word.set_color0(lane, r, g, b);
                    } else {
                        word.set_color1(lane, r, g, b);
                    }
                }
            }
        }
    }

    /// On-time of a slot in nanoseconds at the given raw brightness byte.
    pub(crate) fn slot_nanos(&self, slot: &Slot, brightness: u8) -> u64 {
        (self.lsb_ns << slot.plane) * brightness as u64 / 255
    }

    /// Whether a slot takes part in this refresh cycle. Planes below the
    /// dither threshold are spread over consecutive cycles, halving in
    /// frequency per plane of significance they lack.
    pub(crate) fn slot_active(&self, slot: &Slot, cycle: u64) -> bool {
        if slot.plane >= self.dither_bits {
            return true;
        }
        cycle % (1u64 << (self.dither_bits - slot.plane)) == 0
    }
}

/// Map the RGB color onto the physical color lines per the wiring order,
/// applying inversion first.
fn line_values(
    color: crate::Color,
    order: [usize; 3],
    inverse: bool,
) -> [u8; 3] {
    use embedded_graphics::pixelcolor::RgbColor;
    let mut rgb = [color.r(), color.g(), color.b()];
    if inverse {
        rgb = rgb.map(|v| 255 - v);
    }
    order.map(|channel| rgb[channel])
}

/// Scale an 8-bit channel to the configured PWM depth.
fn scale_channel(value: u8, pwm_bits: u8) -> u16 {
    if pwm_bits >= 8 {
        (value as u16) << (pwm_bits - 8)
    } else {
        (value >> (8 - pwm_bits)) as u16
    }
}
