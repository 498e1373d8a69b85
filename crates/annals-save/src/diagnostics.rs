use ariadne::{Color, Label, Report, ReportKind, Source};
use std::fmt;

use crate::error::SaveError;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The member could not be parsed.
    Error,
    /// Something worth surfacing that did not abort the parse.
    Warning,
}

/// A diagnostic message with source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// How serious this diagnostic is.
    pub severity: Severity,
    /// Byte range of the offending input in the member text.
    pub span: std::ops::Range<usize>,
    /// Human-readable description.
    pub message: String,
    /// Optional label shown against the span itself.
    pub label: Option<String>,
}

impl Diagnostic {
    /// An error-severity diagnostic.
    pub fn error(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// A warning-severity diagnostic.
    pub fn warning(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// Attach a label shown against the span.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build the diagnostic for a failed member parse.
    pub fn from_save_error(error: &SaveError) -> Self {
        Diagnostic::error(error.span().range(), error.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{prefix}: {}", self.message)
    }
}

/// Render diagnostics against the member source for terminal output.
///
/// `member_name` is whatever identifies the text to a human — typically the
/// container member name, possibly prefixed by the save's file name.
pub fn render_diagnostics(source: &str, member_name: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let color = match diag.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let span = (member_name, diag.span.clone());
        let mut report = Report::build(kind, span).with_message(&diag.message);

        let label_text = diag.label.as_deref().unwrap_or(&diag.message);
        report = report.with_label(
            Label::new((member_name, diag.span.clone()))
                .with_message(label_text)
                .with_color(color),
        );

        report
            .finish()
            .write((member_name, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::error(0..3, "`=` with no following value at line 1");
        assert_eq!(d.to_string(), "error: `=` with no following value at line 1");
    }

    #[test]
    fn render_points_at_the_failure() {
        let source = "fleet={\n\tships={ 1 2 }\n";
        let err = parse(source).unwrap_err();
        let diag = Diagnostic::from_save_error(&err);
        let output = render_diagnostics(source, "gamestate", &[diag]);
        assert!(!output.is_empty());
        assert!(output.contains("unclosed block"), "output: {output}");
    }
}
