use std::fmt::Write;

use crate::analysis::diagnostic::{Diagnostic, DiagnosticSeverity};
use crate::index::Workspace;
use crate::parser::ast::{SourceSpan, UnitId};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const BLUE: &str = "\x1b[1;34m";

pub struct DiagnosticPrinter<'a> {
    pub use_colors: bool,
    workspace: &'a Workspace,
}

impl<'a> DiagnosticPrinter<'a> {
    pub fn new(workspace: &'a Workspace, use_colors: Option<bool>) -> Self {
        Self {
            use_colors: use_colors.unwrap_or(false),
            workspace,
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }

    fn location(&self, unit: UnitId, span: SourceSpan) -> String {
        let file_name = self
            .workspace
            .unit(unit)
            .map(|u| u.file_name.as_str())
            .unwrap_or("<unknown>");
        format!("{}:{}:{}", file_name, span.start.line, span.start.column + 1)
    }

    pub fn sprint_errors(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();

        for diagnostic in diagnostics {
            let (label, color) = match diagnostic.severity {
                DiagnosticSeverity::Error => ("error", "\x1b[1;31m"),
                DiagnosticSeverity::Warning => ("warning", "\x1b[1;33m"),
                DiagnosticSeverity::Info => ("info", BLUE),
            };
            let header = format!("{}[{}]", label, diagnostic.rule_id);
            let _ = writeln!(
                out,
                "{}{}",
                self.paint(color, &header),
                self.paint(BOLD, &format!(": {}", diagnostic.message))
            );

            let Some(unit_id) = diagnostic.unit else {
                out.push('\n');
                continue;
            };
            let span = diagnostic.span;
            let line_number = span.start.line.to_string();
            let gutter = " ".repeat(line_number.len());
            let _ = writeln!(
                out,
                "{}{} {}",
                gutter,
                self.paint(BLUE, "-->"),
                self.location(unit_id, span)
            );

            let line = self
                .workspace
                .unit(unit_id)
                .and_then(|u| u.source.lines().nth(span.start.line.saturating_sub(1)));
            if let Some(line) = line {
                let bar = self.paint(BLUE, "|");
                let _ = writeln!(out, "{} {}", gutter, bar);
                let _ = writeln!(out, "{} {} {}", self.paint(BLUE, &line_number), bar, line);

                // keep tabs so the carets line up with the source
                let indent: String = line
                    .chars()
                    .take(span.start.column)
                    .map(|c| if c == '\t' { '\t' } else { ' ' })
                    .collect();
                let width = if span.end.line == span.start.line {
                    span.end.column.saturating_sub(span.start.column).max(1)
                } else {
                    line.chars().count().saturating_sub(span.start.column).max(1)
                };
                let carets = self.paint(color, &"^".repeat(width));
                let _ = writeln!(out, "{} {} {}{}", gutter, bar, indent, carets);
            }

            for related in &diagnostic.related_info {
                let _ = writeln!(
                    out,
                    "{} = note: {} at {}",
                    gutter,
                    related.message,
                    self.location(related.unit, related.span)
                );
            }
            out.push('\n');
        }

        out
    }

    pub fn print_errors(&self, diagnostics: &[Diagnostic]) {
        print!("{}", self.sprint_errors(diagnostics))
    }
}
