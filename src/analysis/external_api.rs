use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;

use crate::analysis::SemanticAnalyzer;
use crate::analysis::diagnostic::{Diagnostic, DiagnosticSeverity};
use crate::analysis::diagnostic_printer::DiagnosticPrinter;
use crate::index::Workspace;
use crate::parser::ast::{SourcePosition, SourceSpan};
use crate::preprocessor::BuildContext;
use crate::{GocheckError, gocheck_error};

/// Names the language gives special meaning to
#[derive(Debug, Clone)]
pub struct EntryPoints {
    /// Package whose zero-arity entry function starts a program
    pub entry_package: String,
    pub entry_function: String,
    /// Zero-arity functions with this name may appear any number of times per package
    pub init_function: String,
}

impl Default for EntryPoints {
    fn default() -> Self {
        Self {
            entry_package: "main".to_string(),
            entry_function: "main".to_string(),
            init_function: "init".to_string(),
        }
    }
}

pub struct AnalyzerConfig {
    pub disabled_rules: Vec<String>,
    pub error_limit: Option<usize>,
    pub entry_points: EntryPoints,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            disabled_rules: Vec::new(),
            error_limit: None,
            entry_points: EntryPoints::default(),
        }
    }
}

impl SemanticAnalyzer {
    pub fn analyze_with_config(
        &self,
        workspace: &Workspace,
        config: AnalyzerConfig,
    ) -> Result<(), Vec<Diagnostic>> {
        let mut diagnostics = self.collect_diagnostics(workspace, &config);

        if let Some(limit) = config.error_limit {
            let error_count = diagnostics
                .iter()
                .filter(|d| d.severity == DiagnosticSeverity::Error)
                .count();

            if error_count > limit {
                let mut kept = 0;
                diagnostics.retain(|d| {
                    if d.severity != DiagnosticSeverity::Error {
                        return true;
                    }
                    kept += 1;
                    kept <= limit
                });
                let origin = SourcePosition { line: 0, column: 0 };
                diagnostics.push(Diagnostic {
                    message: format!("Too many errors ({}), stopping analysis", error_count),
                    unit: None,
                    span: SourceSpan {
                        start: origin,
                        end: origin,
                    },
                    severity: DiagnosticSeverity::Info,
                    rule_id: "error-limit".to_string(),
                    related_info: Vec::new(),
                });

                return Err(diagnostics);
            }
        }

        // Return results
        if diagnostics.iter().any(|d| d.severity == DiagnosticSeverity::Error) {
            Err(diagnostics)
        } else {
            Ok(())
        }
    }

    // Method to get all available rules
    pub fn list_rules(&self) -> Vec<(&'static str, &'static str, DiagnosticSeverity)> {
        self.rule_registry
            .get_all_rules()
            .iter()
            .map(|rule| (rule.id(), rule.description(), rule.severity()))
            .collect()
    }

    pub fn describe_rule(&self, rule_id: &str) -> Option<&'static str> {
        self.rule_registry.get_rule(rule_id).map(|rule| rule.description())
    }
}

/// Checks a set of in-memory Go files for duplicate functions and methods and returns the
/// rendered report, an empty string when nothing was found. `file_names` and `sources` must
/// both hold `count` nul terminated strings. On failure a null pointer is returned, out_len
/// is set to 0 and the reason can be read with `gocheck_get_errors`.
///
/// You have to free the returned string using `gocheck_free_string`
#[unsafe(no_mangle)]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe extern "C" fn gocheck_analyze(
    file_names: *const *const c_char,
    sources: *const *const c_char,
    count: c_int,
    out_len: *mut c_int,
) -> *mut c_char {
    let report = build_report(file_names, sources, count).and_then(|report| {
        CString::new(report).map_err(|e| GocheckError::Utf8Error(e.to_string()))
    });

    match report {
        Ok(cstring) => {
            if !out_len.is_null() {
                *out_len = cstring.as_bytes().len() as c_int;
            }
            cstring.into_raw()
        }
        Err(err) => {
            gocheck_error(&format!("gocheck_analyze failed: {}", err));
            if !out_len.is_null() {
                *out_len = 0;
            }
            ptr::null_mut()
        }
    }
}

#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn build_report(
    file_names: *const *const c_char,
    sources: *const *const c_char,
    count: c_int,
) -> Result<String, GocheckError> {
    if file_names.is_null() {
        return Err(GocheckError::NullPointerError("file_names".to_string()));
    }
    if sources.is_null() {
        return Err(GocheckError::NullPointerError("sources".to_string()));
    }

    let mut workspace = Workspace::new(BuildContext::default());
    for i in 0..count.max(0) as usize {
        let file_name = read_c_str(*file_names.add(i), "file name")?;
        let source = read_c_str(*sources.add(i), "source")?;
        workspace.add_source(file_name, source)?;
    }

    let analyzer = SemanticAnalyzer::new();
    let diagnostics = analyzer.collect_diagnostics(&workspace, &AnalyzerConfig::default());
    Ok(DiagnosticPrinter::new(&workspace, None).sprint_errors(&diagnostics))
}

#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn read_c_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, GocheckError> {
    if ptr.is_null() {
        return Err(GocheckError::NullPointerError(what.to_string()));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|e| GocheckError::Utf8Error(e.to_string()))
}
