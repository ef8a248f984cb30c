//! Diagnostic collection and rendering.
//!
//! Every pipeline stage reports problems through a shared [`Handler`].
//! Stages collect as many diagnostics as they can rather than stopping at
//! the first; the driver checks [`Handler::has_errors`] between stages and
//! skips downstream stages when a gate fails.
//!
//! Rendered form is fixed:
//!
//! ```text
//! [ Line 3 ] Syntax Error: Expected ; after statement.
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::Span;

/// Which pipeline stage produced a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Character-level errors: unknown symbol, unterminated string,
    /// malformed number.
    Lexical,
    /// Token-level errors: missing punctuation, structural mismatches,
    /// disallowed constructs.
    Syntax,
    /// Pre-execution errors from the resolver: illegal `break`/`return`/
    /// `this`/`super`/`__init__` contexts, self-referential initializers.
    Static,
    /// Errors raised while executing: type errors, arity mismatches,
    /// unknown names.
    Runtime,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Lexical => write!(f, "Lexical Error"),
            Stage::Syntax => write!(f, "Syntax Error"),
            Stage::Static => write!(f, "Static Error"),
            Stage::Runtime => write!(f, "Runtime Error"),
        }
    }
}

/// A single reported problem.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Stage that produced the diagnostic.
    pub stage: Stage,
    /// Human-readable message.
    pub message: String,
    /// Source location the message is anchored to.
    pub span: Span,
}

impl Diagnostic {
    /// Create a diagnostic.
    pub fn new(stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self {
            stage,
            message: message.into(),
            span,
        }
    }

    /// Render the diagnostic in the fixed console format.
    pub fn render(&self) -> String {
        format!("[ Line {} ] {}: {}", self.span.line, self.stage, self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Collector for diagnostics.
///
/// Interior mutability lets lexer, parser, and resolver share one handler
/// by plain reference while each keeps `&mut self` for its own state.
///
/// # Examples
///
/// ```
/// use plox_util::{Handler, Span, Stage};
///
/// let handler = Handler::new();
/// handler.error(Stage::Syntax, "Expected ; after statement.", Span::point(3));
///
/// assert!(handler.has_errors());
/// assert_eq!(handler.error_count(), 1);
/// ```
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create an empty handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Report an error for the given stage.
    pub fn error(&self, stage: Stage, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::new(stage, message, span));
    }

    /// Emit a pre-built diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Whether any diagnostics have been collected.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.borrow().is_empty()
    }

    /// Number of collected diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    /// Drain all collected diagnostics, leaving the handler empty.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }

    /// Clone out the collected diagnostics without draining them.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }
}
