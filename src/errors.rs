//! Error Types
//!
//! This module defines the error types used throughout the library.
//!
//! # Overview
//!
//! The main error type [`BufferError`] covers the two failure modes of a
//! mirrored buffer:
//! - Positional errors from element-level operations
//! - Allocation failures during capacity growth
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, BufferError>`.
//!
//! ```rust,ignore
//! use mirage::errors::{BufferError, Result};
//!
//! fn upload_sprites() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for mirrored buffer operations.
///
/// Each variant provides specific context about what went wrong. Both
/// variants leave the buffer in its last-known-good state: a failed
/// operation is never partially applied.
#[derive(Error, Debug)]
pub enum BufferError {
    /// Element position outside the live range `[0, count)`.
    ///
    /// Always a caller programming error; never retried internally.
    #[error("Element position out of range: {position} (buffer holds {count} elements)")]
    OutOfRange {
        /// The offending position argument
        position: usize,
        /// Number of live elements at the time of the call
        count: usize,
    },

    /// CPU or GPU allocation failed during capacity growth.
    ///
    /// Surfaced to the caller without retry; the buffer keeps its prior
    /// capacity and contents.
    #[error("Buffer allocation failed: {0}")]
    ResourceExhausted(String),
}

/// Alias for `Result<T, BufferError>`.
pub type Result<T> = std::result::Result<T, BufferError>;
