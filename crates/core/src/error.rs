//! Error types for the serialization engine.
//!
//! The bit cursor reports overflow through a sticky per-cursor flag (see
//! [`crate::bitio::BitCursor`]): an overflowing read or write sets the flag
//! and returns without touching anything else, and callers inspect the flag
//! at logical boundaries such as the end of packet assembly. The variants
//! here cover the failures that surface as real `Result`s instead:
//! growing-cursor reallocation, stream output, and the `check()` bridge
//! that turns the sticky flag into an error value.

use thiserror::Error;

/// Top-level error type for all fallible operations in the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The cursor's sticky error flag is set: an earlier operation ran past
    /// the readable or writable bit window.
    #[error("bit cursor overflowed at bit {bit_num} (write window is {window} bits)")]
    CursorOverflow {
        /// Bit position the cursor had reached when the flag was observed.
        bit_num: usize,
        /// The cursor's write-side bit window.
        window: usize,
    },

    /// A growing cursor failed to reallocate its backing buffer.
    #[error("buffer reallocation failed: {0}")]
    Alloc(#[from] std::collections::TryReserveError),

    /// I/O error while draining a cursor into a stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
