use thiserror::Error;

/// Errors surfaced by the matrix engine.
///
/// Configuration and initialization problems are fatal to the construction
/// attempt that raised them; range errors are per-call and leave all other
/// state untouched. Nothing in the crate retries on its own.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid geometry, unknown pixel-mapper, unsupported panel type, or any
    /// other bad option. Raised during construction, before the GPIO backend
    /// is touched.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The GPIO backend refused the hardware claim or the refresh thread
    /// could not be started.
    #[error("initialization failed: {0}")]
    Init(String),

    /// Pixel coordinates outside the canvas.
    #[error("pixel ({x}, {y}) outside {width}x{height} canvas")]
    OutOfRange {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    /// A pixel buffer too small for the rectangle it should cover.
    #[error("pixel buffer holds {len} colors but {needed} are required")]
    ShortBuffer { len: usize, needed: usize },

    /// A font file that could not be parsed as BDF.
    #[error("bad font: {0}")]
    Font(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
