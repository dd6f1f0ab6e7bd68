use crate::analysis::collision::{CheckOutcome, find_duplicates};
use crate::analysis::context::AnalysisContext;
use crate::analysis::diagnostic::{Diagnostic, DiagnosticRelatedInfo, DiagnosticSeverity};
use crate::analysis::exemption::is_main_entry;
use crate::analysis::key::{function_key, method_key};
use crate::analysis::rule::SemanticRule;
use crate::parser::ast::{AstNode, DeclId, Declaration};

pub const DUPLICATE_FUNCTION: &str = "duplicate function name";
pub const DUPLICATE_METHOD: &str = "duplicate method name";

// Rule to check for functions and methods declared twice in one package
pub struct DuplicateDeclarationRule;

impl DuplicateDeclarationRule {
    fn report(
        &self,
        ctx: &mut AnalysisContext,
        subject: DeclId,
        declaration: &Declaration,
        message: &str,
        peers: &[DeclId],
    ) {
        let name = declaration.name().map(|ident| ident.name.as_str()).unwrap_or("_");
        let related_info = peers
            .iter()
            .filter_map(|&peer| {
                let other = ctx.index.declaration(peer)?;
                Some(DiagnosticRelatedInfo {
                    message: format!("other declaration of {}", name),
                    unit: peer.unit,
                    span: other.anchor(),
                })
            })
            .collect();

        ctx.diagnostics.add(Diagnostic {
            message: message.to_string(),
            unit: Some(subject.unit),
            span: declaration.anchor(),
            severity: self.severity(),
            rule_id: self.id().to_string(),
            related_info,
        });
    }
}

impl SemanticRule for DuplicateDeclarationRule {
    fn id(&self) -> &'static str {
        "duplicate-declaration"
    }

    fn description(&self) -> &'static str {
        "Checks for functions and methods declared more than once in a package"
    }

    fn severity(&self) -> DiagnosticSeverity {
        DiagnosticSeverity::Error
    }

    fn check(&self, ctx: &mut AnalysisContext, node: &AstNode) {
        let AstNode::Declaration(subject, declaration) = node;
        let subject = *subject;
        let scopes = ctx.scopes;
        let package = scopes.package_name(subject.unit);

        let (outcome, message) = match declaration {
            Declaration::Method(method) => {
                // the method key only names the receiver type, the name is compared here
                let gate = ctx.gate;
                let name = method.name.as_ref().map(|ident| ident.name.as_str());
                let outcome = find_duplicates(
                    ctx,
                    subject,
                    declaration,
                    || method_key(package?, method),
                    |candidate| {
                        candidate.declaration.name().map(|ident| ident.name.as_str()) == name
                            && gate.is_visible(candidate.id.unit)
                    },
                );
                (outcome, DUPLICATE_METHOD)
            }
            Declaration::Function(func) => {
                let main_entry = is_main_entry(func, package, ctx.entry_points);
                let outcome = find_duplicates(
                    ctx,
                    subject,
                    declaration,
                    || function_key(func),
                    |candidate| !main_entry || candidate.id.unit == subject.unit,
                );
                (outcome, DUPLICATE_FUNCTION)
            }
        };

        if let CheckOutcome::Duplicates(peers) = outcome {
            self.report(ctx, subject, declaration, message, &peers);
        }
    }
}
