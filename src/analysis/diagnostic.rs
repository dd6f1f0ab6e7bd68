use crate::parser::ast::{SourceSpan, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    /// `None` for diagnostics about the analysis itself
    pub unit: Option<UnitId>,
    pub span: SourceSpan,
    pub severity: DiagnosticSeverity,
    pub rule_id: String,
    pub related_info: Vec<DiagnosticRelatedInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticRelatedInfo {
    pub message: String,
    pub unit: UnitId,
    pub span: SourceSpan,
}

pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self { diagnostics: Vec::new() }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
