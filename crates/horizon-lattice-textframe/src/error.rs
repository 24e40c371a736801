//! Error types for the text frame crate.

use thiserror::Error;

/// Errors that can occur while building a text frame.
///
/// Queries on an existing frame never fail; they return empty values instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFrameError {
    /// The cancellation flag was signalled while the layout was running.
    #[error("text frame layout was cancelled")]
    Cancelled,
}

/// Result type for text frame construction.
pub type TextFrameResult<T> = Result<T, TextFrameError>;
