use crate::error::Error;

/// Scan mode of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    Progressive = 0,
    Interlaced = 1,
}

/// Type of multiplexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Multiplexing {
    #[default]
    Direct = 0,
    Stripe = 1,
    Checker = 2,
}

/// Immutable configuration snapshot captured at matrix construction.
///
/// Build one with struct-update syntax and hand it to
/// [`LedMatrix::new`](crate::matrix::LedMatrix::new):
///
/// ```rust
/// use hub75_matrix::MatrixOptions;
///
/// let options = MatrixOptions {
///     rows: 64,
///     cols: 64,
///     chain_length: 4,
///     brightness: 50,
///     ..MatrixOptions::default()
/// };
/// ```
///
/// Configuration is structured-only: every knob lives here, including
/// `gpio_slowdown`. There is no textual-flag compatibility layer.
#[derive(Debug, Clone)]
pub struct MatrixOptions {
    /// Name of the wiring scheme between GPIO header and panel, passed
    /// through to the backend. `None` selects the backend default.
    pub hardware_mapping: Option<String>,
    /// Rows of one panel module: 8, 16, 32 or 64.
    pub rows: usize,
    /// Columns of one panel module. `cols * chain_length` is the full width
    /// of the display, so cols=32 chain=2 and cols=64 chain=1 are the same
    /// display.
    pub cols: usize,
    /// Number of panels daisy-chained output-to-input.
    pub chain_length: usize,
    /// Number of chains driven in parallel (1..=3); the effective height is
    /// `rows * parallel`.
    pub parallel: usize,
    /// PWM bits used for output, 1..=11. Lower values need less CPU and
    /// increase the refresh rate.
    pub pwm_bits: u8,
    /// On-time of the least significant bit plane, in nanoseconds. Higher
    /// values improve color accuracy at the cost of frame rate.
    pub pwm_lsb_nanoseconds: u32,
    /// Number of low bit planes to time-dither over consecutive refresh
    /// cycles for a higher refresh rate.
    pub pwm_dither_bits: u8,
    /// Initial brightness in percent, 1..=100.
    pub brightness: u8,
    pub scan_mode: ScanMode,
    /// 0 for direct row selection, 1 for panels with A/B addressing
    /// (typically some 64x64 panels).
    pub row_address_type: u8,
    pub multiplexing: Multiplexing,
    /// The panel's real color wiring if it is not `"RGB"`.
    pub led_rgb_sequence: Option<String>,
    /// Semicolon-separated chain of named pixel mappers, e.g.
    /// `"U-mapper;Rotate:90"`.
    pub pixel_mapper_config: Option<String>,
    /// Panel model requiring an init sequence, e.g. `"FM6126A"`.
    pub panel_type: Option<String>,
    /// Never ask the backend for hardware-timed output-enable pulses.
    pub disable_hardware_pulsing: bool,
    /// Periodically log the measured refresh rate.
    pub show_refresh_rate: bool,
    pub inverse_colors: bool,
    /// Cap on the refresh rate; 0 means unlimited.
    pub limit_refresh_rate_hz: u32,
    /// Slowdown factor for fast boards driving slow panels.
    pub gpio_slowdown: u32,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            hardware_mapping: None,
            rows: 32,
            cols: 32,
            chain_length: 1,
            parallel: 1,
            pwm_bits: 11,
            pwm_lsb_nanoseconds: 130,
            pwm_dither_bits: 0,
            brightness: 100,
            scan_mode: ScanMode::Progressive,
            row_address_type: 0,
            multiplexing: Multiplexing::Direct,
            led_rgb_sequence: None,
            pixel_mapper_config: None,
            panel_type: None,
            disable_hardware_pulsing: false,
            show_refresh_rate: false,
            inverse_colors: false,
            limit_refresh_rate_hz: 0,
            gpio_slowdown: 1,
        }
    }
}

const SUPPORTED_ROWS: [usize; 4] = [8, 16, 32, 64];
pub(crate) const MAX_PARALLEL: usize = 3;
pub(crate) const MAX_PWM_BITS: u8 = 11;

impl MatrixOptions {
    /// Validate every field. Called eagerly by the matrix constructor so that
    /// bad geometry never reaches the hardware.
    pub fn validate(&self) -> Result<(), Error> {
        if !SUPPORTED_ROWS.contains(&self.rows) {
            return Err(Error::Config(format!(
                "unsupported rows {} (supported: {:?})",
                self.rows, SUPPORTED_ROWS
            )));
        }
        if self.cols == 0 || self.cols % 8 != 0 {
            return Err(Error::Config(format!(
                "cols must be a positive multiple of 8, got {}",
                self.cols
            )));
        }
        if self.chain_length == 0 {
            return Err(Error::Config("chain_length must be at least 1".into()));
        }
        if self.parallel == 0 || self.parallel > MAX_PARALLEL {
            return Err(Error::Config(format!(
                "parallel must be 1..={MAX_PARALLEL}, got {}",
                self.parallel
            )));
        }
        if self.pwm_bits == 0 || self.pwm_bits > MAX_PWM_BITS {
            return Err(Error::Config(format!(
                "pwm_bits must be 1..={MAX_PWM_BITS}, got {}",
                self.pwm_bits
            )));
        }
        if self.pwm_dither_bits > self.pwm_bits {
            return Err(Error::Config(format!(
                "pwm_dither_bits {} exceeds pwm_bits {}",
                self.pwm_dither_bits, self.pwm_bits
            )));
        }
        if self.brightness == 0 || self.brightness > 100 {
            return Err(Error::Config(format!(
                "brightness must be 1..=100 percent, got {}",
                self.brightness
            )));
        }
        if self.row_address_type > 1 {
            return Err(Error::Config(format!(
                "row_address_type must be 0 or 1, got {}",
                self.row_address_type
            )));
        }
        if self.gpio_slowdown == 0 {
            return Err(Error::Config("gpio_slowdown must be at least 1".into()));
        }
        self.channel_order()?;
        Ok(())
    }

    /// Width of the panel chain before pixel mapping.
    pub(crate) fn matrix_width(&self) -> usize {
        self.cols * self.chain_length
    }

    /// Height of the panel chain before pixel mapping.
    pub(crate) fn matrix_height(&self) -> usize {
        self.rows * self.parallel
    }

    /// Number of scan rows; HUB75 drives two physical rows per address.
    pub(crate) fn scan_rows(&self) -> usize {
        self.rows / 2
    }

    /// Parse `led_rgb_sequence` into per-output source channel indices:
    /// `order[i]` is the RGB channel wired to panel data line `i`.
    pub(crate) fn channel_order(&self) -> Result<[usize; 3], Error> {
        let seq = match self.led_rgb_sequence.as_deref() {
            None | Some("") => return Ok([0, 1, 2]),
            Some(s) => s,
        };
        let mut order = [usize::MAX; 3];
        let mut seen = [false; 3];
        for (i, c) in seq.chars().enumerate() {
            let channel = match c.to_ascii_uppercase() {
                'R' => 0,
                'G' => 1,
                'B' => 2,
                _ => {
                    return Err(Error::Config(format!(
                        "led_rgb_sequence {seq:?} contains {c:?}"
                    )))
                }
            };
            if i >= 3 || seen[channel] {
                return Err(Error::Config(format!(
                    "led_rgb_sequence {seq:?} is not a permutation of \"RGB\""
                )));
            }
            seen[channel] = true;
            order[i] = channel;
        }
        if seen != [true; 3] {
            return Err(Error::Config(format!(
                "led_rgb_sequence {seq:?} is not a permutation of \"RGB\""
            )));
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        MatrixOptions::default().validate().unwrap();
    }

    #[test]
    fn rejects_unsupported_rows() {
        let options = MatrixOptions {
            rows: 7,
            ..MatrixOptions::default()
        };
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_zero_chain_and_excess_parallel() {
        let options = MatrixOptions {
            chain_length: 0,
            ..MatrixOptions::default()
        };
        assert!(options.validate().is_err());
        let options = MatrixOptions {
            parallel: 4,
            ..MatrixOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn derived_geometry() {
        let options = MatrixOptions {
            rows: 64,
            cols: 64,
            chain_length: 4,
            parallel: 1,
            ..MatrixOptions::default()
        };
        assert_eq!(options.matrix_width(), 256);
        assert_eq!(options.matrix_height(), 64);
        assert_eq!(options.scan_rows(), 32);
    }

    #[test]
    fn channel_order_permutations() {
        let mut options = MatrixOptions::default();
        assert_eq!(options.channel_order().unwrap(), [0, 1, 2]);
        options.led_rgb_sequence = Some("BGR".into());
        assert_eq!(options.channel_order().unwrap(), [2, 1, 0]);
        options.led_rgb_sequence = Some("RBG".into());
        assert_eq!(options.channel_order().unwrap(), [0, 2, 1]);
        options.led_rgb_sequence = Some("RGG".into());
        assert!(options.channel_order().is_err());
        options.led_rgb_sequence = Some("RG".into());
        assert!(options.channel_order().is_err());
        options.led_rgb_sequence = Some("RGBA".into());
        assert!(options.channel_order().is_err());
    }

    #[test]
    fn dither_bits_bounded_by_pwm_bits() {
        let options = MatrixOptions {
            pwm_bits: 3,
            pwm_dither_bits: 4,
            ..MatrixOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
