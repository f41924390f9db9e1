//! Error types shared across the engine.

use thiserror::Error;

/// Errors that can abort a processing cycle.
///
/// Every variant is local and caller-recoverable: the cycle that raised it is
/// aborted with prior tracker state untouched, and the next cycle may proceed
/// normally. The engine itself contains no retry logic; retries belong to the
/// acquisition and alerting collaborators.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A malformed frame or candidate argument reached a component boundary.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A frame buffer does not match the declared RGBA geometry.
    #[error("frame buffer of {actual} bytes does not match {width}x{height} RGBA geometry")]
    FrameGeometry {
        /// Expected frame width in pixels.
        width: u32,
        /// Expected frame height in pixels.
        height: u32,
        /// The byte length that was actually supplied.
        actual: usize,
    },
}
