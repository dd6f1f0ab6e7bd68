use crate::analysis::external_api::EntryPoints;
use crate::parser::ast::{Declaration, FunctionDeclaration};

/// Declarations never checked for duplicates: blank names and zero-arity `init` functions
pub fn is_exempt(decl: &Declaration, entry_points: &EntryPoints) -> bool {
    if decl.is_blank() {
        return true;
    }
    match decl {
        Declaration::Function(func) => {
            func.parameter_count == 0 && has_name(func, &entry_points.init_function)
        }
        Declaration::Method(_) => false,
    }
}

/// A zero-arity entry function in the entry package. Only duplicates within
/// the same unit count for these.
pub fn is_main_entry(
    func: &FunctionDeclaration,
    package: Option<&str>,
    entry_points: &EntryPoints,
) -> bool {
    func.parameter_count == 0
        && has_name(func, &entry_points.entry_function)
        && package == Some(entry_points.entry_package.as_str())
}

fn has_name(func: &FunctionDeclaration, name: &str) -> bool {
    func.name.as_ref().is_some_and(|ident| ident.name == name)
}
