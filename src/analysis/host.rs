use crate::analysis::key::LookupKey;
use crate::parser::ast::{DeclId, Declaration, DeclarationKind, UnitId};

/// Bounds an index lookup to the units of one package: same directory, same package clause
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub directory: String,
    pub package: String,
}

/// Declarations registered by lookup key
pub trait SymbolIndex {
    /// Every declaration of `kind` registered under `key` inside `scope`,
    /// the declaration the query was built from included
    fn lookup_by_key(&self, kind: DeclarationKind, key: &LookupKey, scope: &Scope) -> Vec<DeclId>;

    fn declaration(&self, id: DeclId) -> Option<&Declaration>;
}

pub trait ScopeProvider {
    fn package_scope(&self, unit: UnitId) -> Option<Scope>;

    fn package_name(&self, unit: UnitId) -> Option<&str>;
}

/// Decides whether a unit takes part in the current build configuration
pub trait VisibilityGate {
    fn is_visible(&self, unit: UnitId) -> bool;
}
