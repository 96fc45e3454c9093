//! Error types for the Telebot core.
//!
//! Transport failures never appear here: they are normalized into the
//! [`ApiResponse`](crate::ApiResponse) envelope before reaching the core.
//! Runtime-level errors (configuration, authentication, polling) live in
//! `telebot-runtime`.

use thiserror::Error;

/// A boxed, thread-safe error as returned by application handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Pattern Errors
// =============================================================================

/// A rule pattern failed to compile.
#[derive(Debug, Error)]
#[error("invalid rule pattern `{pattern}`: {source}")]
pub struct InvalidPatternError {
    /// The pattern source as given at registration.
    pub pattern: String,
    /// The underlying pattern engine error.
    #[source]
    pub source: Box<fancy_regex::Error>,
}

impl InvalidPatternError {
    pub(crate) fn new(pattern: impl Into<String>, source: fancy_regex::Error) -> Self {
        Self {
            pattern: pattern.into(),
            source: Box::new(source),
        }
    }
}

// =============================================================================
// Extraction Errors
// =============================================================================

/// Errors that can occur while resolving handler parameters.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// A named capture group required by the handler does not exist.
    #[error("capture group '{0}' not present in pattern")]
    MissingGroup(String),

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

// =============================================================================
// Handler Errors
// =============================================================================

/// An error raised while invoking an application handler.
///
/// The dispatcher does not catch these; they propagate to whoever called
/// `process_update`.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler itself returned an error.
    #[error("handler failed: {0}")]
    Handler(BoxError),

    /// A handler parameter could not be extracted.
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl HandlerError {
    /// Wraps any error as a handler failure.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Result type returned by every handler invocation.
pub type HandlerResult = Result<(), HandlerError>;
