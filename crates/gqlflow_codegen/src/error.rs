//! Error types for translation and generation.

use crate::source::NodeKind;
use gqlflow_core::{Diagnostic, Span};
use miette::SourceSpan;
use thiserror::Error;

/// A fatal translation error.
///
/// Messages end with an indented excerpt of the offending source, so they
/// stay readable without a source-aware renderer.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum TranslateError {
    /// A node was consulted before it had a translation.
    #[error("replacement not found for {kind}{excerpt}")]
    #[diagnostic(code(gqlflow::dispatch_miss))]
    DispatchMiss {
        kind: NodeKind,
        #[label("no translation for this node")]
        span: SourceSpan,
        excerpt: String,
    },

    /// A top-level definition has no name to order it by.
    #[error("unable to find name of {kind}{excerpt}")]
    #[diagnostic(code(gqlflow::unsupported_name))]
    UnsupportedName {
        kind: NodeKind,
        #[label("definition without a name")]
        span: SourceSpan,
        excerpt: String,
    },

    /// A child produced a translation of the wrong shape.
    #[error("expected {expected} for {kind}, found {found}{excerpt}")]
    #[diagnostic(code(gqlflow::unexpected_translation))]
    UnexpectedTranslation {
        kind: NodeKind,
        expected: &'static str,
        found: &'static str,
        #[label("unexpected translation")]
        span: SourceSpan,
        excerpt: String,
    },
}

impl TranslateError {
    /// Returns the source span the error points at.
    #[must_use]
    pub fn span(&self) -> SourceSpan {
        match self {
            Self::DispatchMiss { span, .. }
            | Self::UnsupportedName { span, .. }
            | Self::UnexpectedTranslation { span, .. } => *span,
        }
    }
}

/// Formats a source excerpt for an error message.
///
/// Empty when the span has no text, as for hand-built trees.
pub(crate) fn excerpt(source: &str, span: Span) -> String {
    let text = span.slice(source);
    if text.is_empty() {
        String::new()
    } else {
        format!("\n\n  {text}")
    }
}

/// Error from the full parse-and-translate pipeline.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum GenerateError {
    /// The schema did not parse.
    #[error("schema has {} syntax error(s)", .errors.len())]
    #[diagnostic(code(gqlflow::parse))]
    Parse { errors: Vec<Diagnostic> },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Translate(#[from] TranslateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt() {
        let source = "scalar URI\ntype A { a: URI }";
        assert_eq!(excerpt(source, Span::new(0, 10)), "\n\n  scalar URI");
        assert_eq!(excerpt(source, Span::empty(3)), "");
        assert_eq!(excerpt("", Span::new(0, 10)), "");
    }

    #[test]
    fn test_dispatch_miss_message() {
        let err = TranslateError::DispatchMiss {
            kind: NodeKind::NamedType,
            span: Span::new(0, 3).into(),
            excerpt: excerpt("URI", Span::new(0, 3)),
        };
        assert_eq!(err.to_string(), "replacement not found for NamedType\n\n  URI");
        assert_eq!(err.span(), SourceSpan::from(0..3));
    }
}
