use std::collections::HashMap;
use std::path::Path;

use log::debug;

use crate::GocheckError;
use crate::analysis::host::{Scope, ScopeProvider, SymbolIndex, VisibilityGate};
use crate::analysis::{LookupKey, function_key, method_key};
use crate::parser::ast::*;
use crate::parser::parse_source_unit;
use crate::preprocessor::BuildContext;

type KeyTable = HashMap<Scope, HashMap<LookupKey, Vec<DeclId>>>;

/// An immutable snapshot of parsed units and the declaration indexes built from them
pub struct Workspace {
    units: Vec<SourceUnit>,
    functions: KeyTable,
    methods: KeyTable,
    build: BuildContext,
}

impl Workspace {
    pub fn new(build: BuildContext) -> Self {
        Self {
            units: Vec::new(),
            functions: HashMap::new(),
            methods: HashMap::new(),
            build,
        }
    }

    /// Parses a Go file and registers its declarations
    pub fn add_source(&mut self, file_name: &str, source: &str) -> Result<UnitId, GocheckError> {
        let unit = parse_source_unit(file_name, source)?;
        Ok(self.add_unit(unit))
    }

    pub fn add_unit(&mut self, unit: SourceUnit) -> UnitId {
        let id = UnitId(self.units.len());
        let scope = scope_of(&unit);

        for (slot, decl) in unit.declarations.iter().enumerate() {
            let decl_id = DeclId { unit: id, slot };
            let (table, key) = match decl {
                Declaration::Function(func) => (&mut self.functions, function_key(func)),
                Declaration::Method(method) => (&mut self.methods, method_key(&unit.package, method)),
            };
            if let Some(key) = key {
                table
                    .entry(scope.clone())
                    .or_default()
                    .entry(key)
                    .or_default()
                    .push(decl_id);
            }
        }

        debug!(
            "indexed {} declarations of package {} from {}",
            unit.declarations.len(),
            unit.package,
            unit.file_name
        );
        self.units.push(unit);
        id
    }

    pub fn unit(&self, id: UnitId) -> Option<&SourceUnit> {
        self.units.get(id.0)
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &SourceUnit)> {
        self.units.iter().enumerate().map(|(i, unit)| (UnitId(i), unit))
    }

    pub fn build_context(&self) -> &BuildContext {
        &self.build
    }
}

fn scope_of(unit: &SourceUnit) -> Scope {
    let directory = Path::new(&unit.file_name)
        .parent()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_default();
    Scope {
        directory,
        package: unit.package.clone(),
    }
}

impl SymbolIndex for Workspace {
    fn lookup_by_key(&self, kind: DeclarationKind, key: &LookupKey, scope: &Scope) -> Vec<DeclId> {
        let table = match kind {
            DeclarationKind::Function => &self.functions,
            DeclarationKind::Method => &self.methods,
        };
        table
            .get(scope)
            .and_then(|keys| keys.get(key))
            .cloned()
            .unwrap_or_default()
    }

    fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.unit(id.unit)?.declarations.get(id.slot)
    }
}

impl ScopeProvider for Workspace {
    fn package_scope(&self, unit: UnitId) -> Option<Scope> {
        self.unit(unit).map(scope_of)
    }

    fn package_name(&self, unit: UnitId) -> Option<&str> {
        self.unit(unit).map(|u| u.package.as_str())
    }
}

impl VisibilityGate for Workspace {
    fn is_visible(&self, unit: UnitId) -> bool {
        self.unit(unit)
            .is_some_and(|u| self.build.allows(&u.file_name, u.constraint.as_ref()))
    }
}
