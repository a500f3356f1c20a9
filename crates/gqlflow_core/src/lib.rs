//! Core utilities for gqlflow.
//!
//! This crate provides foundational types shared by the parser, the
//! translator and the CLI:
//! - `span`: Source location tracking and excerpts
//! - `text`: String interning
//! - `diagnostics`: Parse error reporting

pub mod diagnostics;
pub mod span;
pub mod text;

pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticSeverity, Label};
pub use span::Span;
pub use text::{Interner, Text};
