//! Runtime errors and non-local control signals.
//!
//! `return` and `break` are modeled as [`Unwind`] variants alongside real
//! runtime errors so they propagate with `?` through the evaluator, while
//! staying distinct: a signal is caught at its legal boundary (calls catch
//! `Return`, loops catch `Break`) and only becomes a user-visible error
//! when it escapes that boundary.

use thiserror::Error;

use crate::value::Value;

/// A user-visible runtime error, anchored to a source line.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
    pub line: u32,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

/// Non-local transfer propagating up the evaluator.
#[derive(Debug)]
pub enum Unwind {
    /// A `return` statement in flight; caught by the enclosing call.
    Return { value: Value, line: u32 },
    /// A `break` statement in flight; caught by the enclosing loop.
    Break(u32),
    /// A runtime error; aborts the current top-level statement.
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}

/// Result type used throughout execution.
pub type Exec<T> = Result<T, Unwind>;
