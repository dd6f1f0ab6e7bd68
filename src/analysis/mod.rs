mod collision;
mod exemption;
mod key;
mod rules;

pub(crate) mod context;
pub(crate) mod diagnostic;
pub(crate) mod diagnostic_printer;
pub(crate) mod external_api;
pub(crate) mod host;
pub(crate) mod rule;
pub(crate) mod rule_registry;

pub(crate) use key::{LookupKey, function_key, method_key};

use log::{debug, trace};

use crate::analysis::context::AnalysisContext;
use crate::analysis::diagnostic::Diagnostic;
use crate::analysis::external_api::AnalyzerConfig;
use crate::analysis::rule_registry::RuleRegistry;
use crate::analysis::rules::duplicate_decl::DuplicateDeclarationRule;
use crate::index::Workspace;
use crate::parser::ast::*;

pub struct SemanticAnalyzer {
    rule_registry: RuleRegistry,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        let mut registry = RuleRegistry::new();

        // Register built-in rules
        registry.register(DuplicateDeclarationRule);

        Self {
            rule_registry: registry,
        }
    }

    /// Checks every unit of the workspace with the default configuration
    pub fn analyze(&self, workspace: &Workspace) -> Result<(), Vec<Diagnostic>> {
        self.analyze_with_config(workspace, AnalyzerConfig::default())
    }

    /// Checks the declarations of a single unit against the rest of its package
    pub fn analyze_unit(&self, workspace: &Workspace, unit_id: UnitId) -> Vec<Diagnostic> {
        self.analyze_unit_with_config(workspace, unit_id, &AnalyzerConfig::default())
    }

    pub fn analyze_unit_with_config(
        &self,
        workspace: &Workspace,
        unit_id: UnitId,
        config: &AnalyzerConfig,
    ) -> Vec<Diagnostic> {
        let mut ctx = AnalysisContext::for_workspace(workspace, &config.entry_points);
        ctx.disabled_rules.extend(config.disabled_rules.iter().cloned());
        if let Some(unit) = workspace.unit(unit_id) {
            self.visit_unit(&mut ctx, unit_id, unit);
        }
        ctx.diagnostics.into_diagnostics()
    }

    pub(crate) fn collect_diagnostics(
        &self,
        workspace: &Workspace,
        config: &AnalyzerConfig,
    ) -> Vec<Diagnostic> {
        let mut ctx = AnalysisContext::for_workspace(workspace, &config.entry_points);
        ctx.disabled_rules.extend(config.disabled_rules.iter().cloned());

        debug!("analyzing {} units", workspace.units().count());
        for (unit_id, unit) in workspace.units() {
            self.visit_unit(&mut ctx, unit_id, unit);
        }
        ctx.diagnostics.into_diagnostics()
    }

    pub(crate) fn visit_unit(&self, ctx: &mut AnalysisContext, unit_id: UnitId, unit: &SourceUnit) {
        for (slot, decl) in unit.declarations.iter().enumerate() {
            self.visit_declaration(ctx, DeclId { unit: unit_id, slot }, decl);
        }
    }

    fn visit_declaration(&self, ctx: &mut AnalysisContext, id: DeclId, decl: &Declaration) {
        trace!(
            "visiting {:?} {:?} in {}",
            decl.kind(),
            decl.name().map(|ident| ident.name.as_str()),
            id.unit.0
        );
        self.apply_rules(ctx, &AstNode::Declaration(id, decl));
    }

    fn apply_rules(&self, ctx: &mut AnalysisContext, node: &AstNode) {
        for rule in self.rule_registry.get_all_rules() {
            if ctx.is_rule_enabled(rule.id()) {
                rule.check(ctx, node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::context::AnalysisContext;
    use crate::analysis::external_api::EntryPoints;
    use crate::analysis::host::VisibilityGate;
    use crate::analysis::rules::duplicate_decl::{DUPLICATE_FUNCTION, DUPLICATE_METHOD};
    use crate::analysis::diagnostic::DiagnosticSeverity;
    use crate::analysis::rule::SemanticRule;
    use crate::preprocessor::BuildContext;
    use std::cell::Cell;
    use std::rc::Rc;

    fn workspace(files: &[(&str, &str)]) -> Workspace {
        let mut workspace = Workspace::new(BuildContext::default());
        for (name, source) in files {
            workspace.add_source(name, source).unwrap();
        }
        workspace
    }

    fn problems(workspace: &Workspace) -> Vec<Diagnostic> {
        match SemanticAnalyzer::new().analyze(workspace) {
            Ok(()) => Vec::new(),
            Err(diagnostics) => diagnostics,
        }
    }

    /// (file name, reported name, message) of every problem
    fn summary(workspace: &Workspace, diagnostics: &[Diagnostic]) -> Vec<(String, String, String)> {
        diagnostics
            .iter()
            .map(|d| {
                let unit = workspace.unit(d.unit.unwrap()).unwrap();
                let line = unit.source.lines().nth(d.span.start.line - 1).unwrap();
                let name: String = line
                    .chars()
                    .skip(d.span.start.column)
                    .take(d.span.end.column - d.span.start.column)
                    .collect();
                (unit.file_name.clone(), name, d.message.clone())
            })
            .collect()
    }

    #[test]
    fn test_analysis() {
        let ws = workspace(&[
            (
                "server/server.go",
                "package server\n\nfunc New() *Server { return nil }\n\nfunc (s *Server) Run() {}\n",
            ),
            (
                "server/options.go",
                "package server\n\nfunc WithAddr(addr string) Option { return nil }\n\nfunc (s Server) Stop() {}\n",
            ),
        ]);
        assert!(SemanticAnalyzer::new().analyze(&ws).is_ok());
    }

    #[test]
    fn duplicate_functions_are_flagged_on_both_sides() {
        let ws = workspace(&[
            ("util/a.go", "package util\n\nfunc helper() {}\n"),
            ("util/b.go", "package util\n\nfunc helper(x int) int { return x }\n"),
        ]);
        let diagnostics = problems(&ws);
        assert_eq!(
            summary(&ws, &diagnostics),
            vec![
                ("util/a.go".to_string(), "helper".to_string(), DUPLICATE_FUNCTION.to_string()),
                ("util/b.go".to_string(), "helper".to_string(), DUPLICATE_FUNCTION.to_string()),
            ]
        );
        assert_eq!(diagnostics[0].rule_id, "duplicate-declaration");
        assert_eq!(diagnostics[0].related_info.len(), 1);
        assert_eq!(diagnostics[0].related_info[0].span, diagnostics[1].span);
    }

    #[test]
    fn duplicate_methods_are_flagged_on_both_sides() {
        let ws = workspace(&[
            ("conn/conn.go", "package conn\n\nfunc (c *Conn) Close() error { return nil }\nfunc (c *Conn) Read() {}\n"),
            ("conn/close.go", "package conn\n\nfunc (c Conn) Close() error { return nil }\nfunc (l *Listener) Close() {}\n"),
        ]);
        let diagnostics = problems(&ws);
        assert_eq!(
            summary(&ws, &diagnostics),
            vec![
                ("conn/conn.go".to_string(), "Close".to_string(), DUPLICATE_METHOD.to_string()),
                ("conn/close.go".to_string(), "Close".to_string(), DUPLICATE_METHOD.to_string()),
            ]
        );
    }

    #[test]
    fn generic_receivers_share_a_key() {
        let ws = workspace(&[(
            "list/list.go",
            "package list\n\nfunc (l *List[T]) Len() int { return 0 }\nfunc (l List[T]) Len() int { return 0 }\n",
        )]);
        assert_eq!(problems(&ws).len(), 2);
    }

    #[test]
    fn functions_and_methods_do_not_collide() {
        let ws = workspace(&[(
            "p/p.go",
            "package p\n\nfunc Close() {}\nfunc (f *File) Close() {}\nfunc (s *Socket) Close() {}\n",
        )]);
        assert!(problems(&ws).is_empty());
    }

    #[test]
    fn blank_declarations_are_never_reported() {
        let ws = workspace(&[
            ("p/a.go", "package p\n\nfunc _() {}\nfunc _() {}\nfunc (T) _() {}\n"),
            ("p/b.go", "package p\n\nfunc _() {}\nfunc (T) _() {}\nfunc (*T) _() {}\n"),
        ]);
        assert!(problems(&ws).is_empty());
    }

    #[test]
    fn zero_arity_init_functions_are_allowed() {
        let ws = workspace(&[
            ("p/a.go", "package p\n\nfunc init() {}\nfunc init() {}\n"),
            ("p/b.go", "package p\n\nfunc init() {}\n"),
            ("p/c.go", "package p\n\nfunc init() {}\n"),
        ]);
        assert!(problems(&ws).is_empty());
    }

    #[test]
    fn init_with_parameters_is_checked() {
        let ws = workspace(&[
            ("p/a.go", "package p\n\nfunc init(x int) {}\n"),
            ("p/b.go", "package p\n\nfunc init() {}\n"),
        ]);
        let diagnostics = problems(&ws);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(ws.unit(diagnostics[0].unit.unwrap()).unwrap().file_name, "p/a.go");
    }

    #[test]
    fn main_in_separate_files_of_main_package_is_allowed() {
        let ws = workspace(&[
            ("cmd/tool/a.go", "package main\n\nfunc main() {}\n"),
            ("cmd/tool/b.go", "package main\n\nfunc main() {}\n"),
        ]);
        assert!(problems(&ws).is_empty());
    }

    #[test]
    fn main_twice_in_one_file_is_reported() {
        let ws = workspace(&[
            ("cmd/tool/a.go", "package main\n\nfunc main() {}\n\nfunc main() {}\n"),
            ("cmd/tool/b.go", "package main\n\nfunc main() {}\n"),
        ]);
        let diagnostics = problems(&ws);
        assert_eq!(
            summary(&ws, &diagnostics),
            vec![
                ("cmd/tool/a.go".to_string(), "main".to_string(), DUPLICATE_FUNCTION.to_string()),
                ("cmd/tool/a.go".to_string(), "main".to_string(), DUPLICATE_FUNCTION.to_string()),
            ]
        );
        assert_eq!(diagnostics[0].related_info.len(), 1);
    }

    #[test]
    fn main_outside_entry_package_is_an_ordinary_function() {
        let ws = workspace(&[
            ("lib/a.go", "package lib\n\nfunc main() {}\n"),
            ("lib/b.go", "package lib\n\nfunc main() {}\n"),
            ("cmd/a.go", "package main\n\nfunc main(args []string) {}\n"),
            ("cmd/b.go", "package main\n\nfunc main(args []string) {}\n"),
        ]);
        assert_eq!(problems(&ws).len(), 4);
    }

    #[test]
    fn package_scope_is_directory_and_package() {
        let ws = workspace(&[
            ("a/x.go", "package util\n\nfunc Do() {}\nfunc (T) M() {}\n"),
            ("b/x.go", "package util\n\nfunc Do() {}\nfunc (T) M() {}\n"),
            ("a/x_test.go", "package util_test\n\nfunc Do() {}\nfunc (T) M() {}\n"),
        ]);
        assert!(problems(&ws).is_empty());
    }

    #[test]
    fn method_peer_in_excluded_unit_is_invisible() {
        let ws = workspace(&[
            ("poll/fd.go", "package poll\n\nfunc (fd *FD) Init() {}\n"),
            ("poll/fd_windows.go", "package poll\n\nfunc (fd *FD) Init() {}\n"),
        ]);
        let diagnostics = problems(&ws);
        // only the windows declaration sees a live peer
        assert_eq!(
            summary(&ws, &diagnostics),
            vec![(
                "poll/fd_windows.go".to_string(),
                "Init".to_string(),
                DUPLICATE_METHOD.to_string()
            )]
        );
    }

    #[test]
    fn method_peer_excluded_by_build_constraint() {
        let ws = workspace(&[
            ("sys/a.go", "//go:build linux\n\npackage sys\n\nfunc (s *Sys) Name() string { return \"a\" }\n"),
            ("sys/b.go", "//go:build !linux\n\npackage sys\n\nfunc (s *Sys) Name() string { return \"b\" }\n"),
        ]);
        let diagnostics = problems(&ws);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(ws.unit(diagnostics[0].unit.unwrap()).unwrap().file_name, "sys/b.go");
    }

    #[test]
    fn function_collisions_ignore_build_constraints() {
        let ws = workspace(&[
            ("sys/a.go", "//go:build linux\n\npackage sys\n\nfunc name() string { return \"a\" }\n"),
            ("sys/b.go", "//go:build !linux\n\npackage sys\n\nfunc name() string { return \"b\" }\n"),
        ]);
        assert_eq!(problems(&ws).len(), 2);
    }

    #[test]
    fn single_declaration_never_collides_with_itself() {
        let ws = workspace(&[(
            "p/p.go",
            "package p\n\nfunc Only() {}\nfunc (t *T) Only() {}\n",
        )]);
        assert!(problems(&ws).is_empty());
    }

    #[test]
    fn unnamed_and_unresolvable_declarations_are_skipped() {
        let ws = workspace(&[
            ("p/a.go", "package p\n\nfunc (x int) {}\nfunc (x int) {}\nfunc (r []T) Len() int { return 0 }\nfunc (r []T) Len() int { return 0 }\n"),
        ]);
        assert!(problems(&ws).is_empty());
    }

    #[test]
    fn analysis_is_idempotent() {
        let ws = workspace(&[
            ("p/a.go", "package p\n\nfunc A() {}\nfunc (t T) M() {}\n"),
            ("p/b.go", "package p\n\nfunc A() {}\nfunc (t *T) M() {}\n"),
        ]);
        let first = problems(&ws);
        let second = problems(&ws);
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }

    #[test]
    fn analyze_unit_only_reports_that_unit() {
        let ws = workspace(&[
            ("p/a.go", "package p\n\nfunc A() {}\n"),
            ("p/b.go", "package p\n\nfunc A() {}\n"),
        ]);
        let (b, _) = ws.units().nth(1).unwrap();
        let diagnostics = SemanticAnalyzer::new().analyze_unit(&ws, b);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].unit, Some(b));
    }

    #[test]
    fn analyze_unit_honours_config() {
        let ws = workspace(&[
            ("cmd/a.go", "package app\n\nfunc start() {}\nfunc main() {}\n"),
            ("cmd/b.go", "package app\n\nfunc start() {}\nfunc main() {}\n"),
        ]);
        let (a, _) = ws.units().next().unwrap();
        let analyzer = SemanticAnalyzer::new();
        assert_eq!(analyzer.analyze_unit(&ws, a).len(), 2);

        let config = AnalyzerConfig {
            entry_points: EntryPoints {
                entry_package: "app".to_string(),
                entry_function: "start".to_string(),
                init_function: "init".to_string(),
            },
            ..AnalyzerConfig::default()
        };
        let diagnostics = analyzer.analyze_unit_with_config(&ws, a, &config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].span.start.line, 4);

        let config = AnalyzerConfig {
            disabled_rules: vec!["duplicate-declaration".to_string()],
            ..AnalyzerConfig::default()
        };
        assert!(analyzer.analyze_unit_with_config(&ws, a, &config).is_empty());
    }

    struct CountNodes(Rc<Cell<usize>>);

    impl SemanticRule for CountNodes {
        fn id(&self) -> &'static str {
            "count-nodes"
        }

        fn description(&self) -> &'static str {
            "Counts the nodes it is applied to"
        }

        fn severity(&self) -> DiagnosticSeverity {
            DiagnosticSeverity::Info
        }

        fn check(&self, _ctx: &mut AnalysisContext, node: &AstNode) {
            let AstNode::Declaration(_, _) = node;
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn rules_are_applied_once_per_declaration() {
        let ws = workspace(&[
            ("p/a.go", "package p\n\nfunc A() {}\nfunc (t T) M() {}\n"),
            ("p/b.go", "package p\n\nimport \"fmt\"\n"),
            ("p/c.go", "package p\n\nfunc init() {}\n"),
        ]);
        let seen = Rc::new(Cell::new(0));
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.rule_registry.register(CountNodes(Rc::clone(&seen)));
        assert!(analyzer.analyze(&ws).is_ok());
        assert_eq!(seen.get(), 3);
    }

    struct HideUnit(UnitId);

    impl VisibilityGate for HideUnit {
        fn is_visible(&self, unit: UnitId) -> bool {
            unit != self.0
        }
    }

    #[test]
    fn injected_gate_is_consulted_for_methods() {
        let ws = workspace(&[
            ("p/a.go", "package p\n\nfunc (t T) M() {}\n"),
            ("p/b.go", "package p\n\nfunc (t T) M() {}\n"),
        ]);
        let (a, _) = ws.units().next().unwrap();
        let entry_points = EntryPoints::default();
        let gate = HideUnit(a);
        let mut ctx = AnalysisContext::new(&ws, &ws, &gate, &entry_points);

        let analyzer = SemanticAnalyzer::new();
        for (id, unit) in ws.units() {
            analyzer.visit_unit(&mut ctx, id, unit);
        }
        let diagnostics = ctx.diagnostics.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].unit, Some(a));
    }
}
