use log::{debug, trace};

use crate::analysis::context::AnalysisContext;
use crate::analysis::exemption::is_exempt;
use crate::analysis::key::LookupKey;
use crate::parser::ast::{DeclId, Declaration};

/// A declaration returned by the symbol index for a duplicate query
#[derive(Clone, Copy)]
pub struct Candidate<'a> {
    pub id: DeclId,
    pub declaration: &'a Declaration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Exempt,
    /// No name or no lookup key could be formed, nothing is compared
    Skipped,
    Clean,
    Duplicates(Vec<DeclId>),
}

/// Runs one duplicate check: exemption, key, package scoped lookup, filtering.
///
/// The subject is always removed by id. `collides` decides for every other
/// candidate whether it counts as a duplicate.
pub fn find_duplicates<K, F>(
    ctx: &AnalysisContext<'_>,
    subject: DeclId,
    declaration: &Declaration,
    build_key: K,
    collides: F,
) -> CheckOutcome
where
    K: FnOnce() -> Option<LookupKey>,
    F: Fn(Candidate<'_>) -> bool,
{
    if is_exempt(declaration, ctx.entry_points) {
        trace!("{:?} is exempt from duplicate checks", subject);
        return CheckOutcome::Exempt;
    }
    if declaration.name().is_none() {
        trace!("{:?} has no name, skipping", subject);
        return CheckOutcome::Skipped;
    }
    let Some(key) = build_key() else {
        trace!("{:?} has no lookup key, skipping", subject);
        return CheckOutcome::Skipped;
    };
    let Some(scope) = ctx.scopes.package_scope(subject.unit) else {
        return CheckOutcome::Skipped;
    };

    let duplicates: Vec<DeclId> = ctx
        .index
        .lookup_by_key(declaration.kind(), &key, &scope)
        .into_iter()
        .filter(|&id| id != subject)
        .filter(|&id| {
            ctx.index
                .declaration(id)
                .is_some_and(|declaration| collides(Candidate { id, declaration }))
        })
        .collect();

    if duplicates.is_empty() {
        CheckOutcome::Clean
    } else {
        debug!("{:?} under key {} collides with {:?}", subject, key, duplicates);
        CheckOutcome::Duplicates(duplicates)
    }
}
