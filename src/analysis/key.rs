use std::fmt;

use crate::parser::ast::{FunctionDeclaration, MethodDeclaration, Receiver, TypeExpr};

/// Key under which the symbol index registers a declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Functions are keyed by their bare name
pub fn function_key(func: &FunctionDeclaration) -> Option<LookupKey> {
    func.name.as_ref().map(|ident| LookupKey(ident.name.clone()))
}

/// Methods are keyed by `package.ReceiverType`, so one key covers the whole method set
pub fn method_key(package: &str, method: &MethodDeclaration) -> Option<LookupKey> {
    let type_key = receiver_type_key(method.receiver.as_ref()?)?;
    Some(LookupKey(format!("{}.{}", package, type_key)))
}

/// The receiver's base type name: `T`, `*T`, `(*T)` and `T[K, V]` all give `T`
pub fn receiver_type_key(receiver: &Receiver) -> Option<&str> {
    base_type_name(&receiver.type_expr, false)
}

fn base_type_name(expr: &TypeExpr, behind_pointer: bool) -> Option<&str> {
    match expr {
        TypeExpr::Named { name, .. } => Some(name.as_str()),
        TypeExpr::Pointer(inner) if !behind_pointer => base_type_name(inner, true),
        TypeExpr::Parenthesized(inner) => base_type_name(inner, behind_pointer),
        _ => None,
    }
}
