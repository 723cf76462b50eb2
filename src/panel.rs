//! Panel-specific behavior: chip init sequences, row-address encoding and
//! the row permutations of multiplexed panels.

use crate::error::Error;
use crate::gpio::{DataWord, GpioBackend};
use crate::options::{Multiplexing, ScanMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PanelType {
    /// Panels built on FM6126A driver chips need two configuration
    /// registers written before they display anything.
    Fm6126a,
}

pub(crate) fn parse_panel(panel_type: Option<&str>) -> Result<Option<PanelType>, Error> {
    match panel_type {
        None | Some("") => Ok(None),
        Some(name) if name.eq_ignore_ascii_case("FM6126A") => Ok(Some(PanelType::Fm6126a)),
        Some(name) => Err(Error::Config(format!("unsupported panel type {name:?}"))),
    }
}

/// Emit the init sequence for `panel` across `columns` columns. Must run
/// before the first frame is driven.
pub(crate) fn init_sequence(backend: &mut dyn GpioBackend, panel: PanelType, columns: usize) {
    match panel {
        PanelType::Fm6126a => init_fm6126a(backend, columns),
    }
}

// FM6126A configuration registers are written by clocking a 16-bit pattern
// down the chain while holding the latch for the trailing 12 (register B12)
// or 13 (register B13) columns.
const FM6126A_B12: u16 = 0b0111_1111_1111_1111; // full brightness
const FM6126A_B13: u16 = 0b0000_0000_0100_0000;

fn init_fm6126a(backend: &mut dyn GpioBackend, columns: usize) {
    log::debug!("running FM6126A init sequence over {columns} columns");
    for (pattern, latch_len) in [(FM6126A_B12, 12), (FM6126A_B13, 13)] {
        for col in 0..columns {
            let on = pattern & (1 << (15 - (col % 16))) != 0;
            let mut word = DataWord::new();
            for lane in 0..3 {
                word.set_color0(lane, on, on, on);
                word.set_color1(lane, on, on, on);
            }
            if col >= columns.saturating_sub(latch_len) {
                backend.set_latch(true);
            }
            backend.shift(word);
        }
        backend.set_latch(false);
    }
}

/// Map a logical scan row to the state of the physical address lines.
///
/// Type 0 presents the row directly. Type 1 covers A/B-addressed panels
/// (typically 64x64): the low bit selects the bank on the topmost address
/// line and the remaining bits follow on the lower lines.
pub(crate) fn encode_row_address(row_address_type: u8, addr: u8) -> u8 {
    match row_address_type {
        1 => ((addr & 1) << 4) | (addr >> 1),
        _ => addr,
    }
}

/// Order in which scan rows are refreshed.
///
/// Multiplexing permutes the rows per a fixed rule: Stripe walks even rows
/// then odd rows; Checker interleaves rows from the two ends of the panel.
/// Interlaced scan then splits whichever sequence resulted into two fields.
pub(crate) fn row_sequence(
    multiplexing: Multiplexing,
    scan_mode: ScanMode,
    scan_rows: usize,
) -> Vec<u8> {
    let base: Vec<u8> = match multiplexing {
        Multiplexing::Direct => (0..scan_rows as u8).collect(),
        Multiplexing::Stripe => (0..scan_rows as u8)
            .step_by(2)
            .chain((1..scan_rows as u8).step_by(2))
            .collect(),
        Multiplexing::Checker => {
            let mut rows = Vec::with_capacity(scan_rows);
            let (mut lo, mut hi) = (0u8, scan_rows as u8);
            while lo < hi {
                rows.push(lo);
                lo += 1;
                if lo < hi {
                    hi -= 1;
                    rows.push(hi);
                }
            }
            rows
        }
    };
    match scan_mode {
        ScanMode::Progressive => base,
        ScanMode::Interlaced => base
            .iter()
            .step_by(2)
            .chain(base.iter().skip(1).step_by(2))
            .copied()
            .collect(),
    }
}
