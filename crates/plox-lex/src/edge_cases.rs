//! Edge case and property tests for plox-lex.
