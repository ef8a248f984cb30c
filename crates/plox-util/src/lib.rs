//! plox-util - Shared infrastructure for the Plox interpreter.
//!
//! This crate carries the pieces every pipeline stage needs:
//!
//! - [`Span`] - source location tracking for diagnostics
//! - [`Symbol`] - interned string handles for identifiers and literals
//! - [`Diagnostic`] / [`Handler`] - error collection and rendering

pub mod diagnostic;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Stage};
pub use span::Span;
pub use symbol::Symbol;

pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
