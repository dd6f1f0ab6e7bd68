use crate::analysis::context::AnalysisContext;
use crate::analysis::diagnostic::DiagnosticSeverity;
use crate::parser::ast::AstNode;

/// A check run against every unit and declaration node of a workspace
pub trait SemanticRule {
    /// Stable id, used by `AnalyzerConfig::disabled_rules` and in printed reports
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn severity(&self) -> DiagnosticSeverity;

    /// Inspects one node; problems go into `ctx.diagnostics`
    fn check(&self, ctx: &mut AnalysisContext, node: &AstNode);
}
