//! Ariadne-based rendering of diagnostics at the reporting boundary.
//!
//! A rendered diagnostic shows the `severity[code]: message` header, the
//! source excerpt with a labeled span, and the catalog's help text when one
//! exists. Output is colorless by default so test assertions and piped
//! output stay stable; `render_diagnostic_colored` is the terminal variant.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::diag::{Diagnostic, Severity};
use crate::intern::StringInterner;
use crate::span::LineIndex;
use crate::token::TokenList;

/// Render a diagnostic into a formatted string, without color.
pub fn render_diagnostic(
    diag: &Diagnostic,
    source: &str,
    tokens: Option<&TokenList>,
    interner: &StringInterner,
) -> String {
    render_with_config(diag, source, tokens, interner, Config::default().with_color(false))
}

/// Render a diagnostic with terminal colors enabled.
pub fn render_diagnostic_colored(
    diag: &Diagnostic,
    source: &str,
    tokens: Option<&TokenList>,
    interner: &StringInterner,
) -> String {
    render_with_config(diag, source, tokens, interner, Config::default())
}

fn render_with_config(
    diag: &Diagnostic,
    source: &str,
    tokens: Option<&TokenList>,
    interner: &StringInterner,
    config: Config,
) -> String {
    let index = LineIndex::new(source);
    let source_len = source.len();

    let start = (index.offset(diag.line, diag.column) as usize).min(source_len);
    let width = diag
        .token
        .and_then(|id| tokens.map(|list| list.get(id).width(interner)))
        .unwrap_or(1) as usize;
    let end = (start + width).min(source_len).max(start);
    // Ariadne wants at least a one-character span where the source allows.
    let end = if start == end {
        (start + 1).min(source_len)
    } else {
        end
    };
    let span = start..end;

    let kind = match diag.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Note => ReportKind::Advice,
    };

    let mut builder = Report::build(kind, span.clone())
        .with_code(diag.code.as_str())
        .with_message(diag.message())
        .with_config(config);

    builder.add_label(
        Label::new(span)
            .with_message(diag.message())
            .with_color(Color::Red),
    );

    if let Some(help) = diag.help() {
        builder.set_help(help);
    }

    let mut buf = Vec::new();
    let _ = builder.finish().write(Source::from(source), &mut buf);
    String::from_utf8(buf).unwrap_or_default()
}
