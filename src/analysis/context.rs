use crate::analysis::diagnostic::DiagnosticCollector;
use crate::analysis::external_api::EntryPoints;
use crate::analysis::host::{ScopeProvider, SymbolIndex, VisibilityGate};
use crate::index::Workspace;
use std::collections::HashSet;

/// Everything a rule sees during one pass over an immutable snapshot
pub struct AnalysisContext<'a> {
    pub diagnostics: DiagnosticCollector,
    pub index: &'a dyn SymbolIndex,
    pub scopes: &'a dyn ScopeProvider,
    pub gate: &'a dyn VisibilityGate,
    pub entry_points: &'a EntryPoints,
    pub disabled_rules: HashSet<String>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        index: &'a dyn SymbolIndex,
        scopes: &'a dyn ScopeProvider,
        gate: &'a dyn VisibilityGate,
        entry_points: &'a EntryPoints,
    ) -> Self {
        Self {
            diagnostics: DiagnosticCollector::new(),
            index,
            scopes,
            gate,
            entry_points,
            disabled_rules: HashSet::new(),
        }
    }

    /// A context whose index, scopes and build gate all come from the workspace
    pub fn for_workspace(workspace: &'a Workspace, entry_points: &'a EntryPoints) -> Self {
        Self::new(workspace, workspace, workspace, entry_points)
    }

    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        !self.disabled_rules.contains(rule_id)
    }
}
