//! Set reconciliation between desired and remote collections.
//!
//! Source and target entities live in independent id spaces, so membership is
//! always decided structurally by a caller supplied key comparison.

use std::collections::HashMap;

/// An entity addressable by a system name unique within its parent scope.
pub trait SystemNamed {
    /// Remote numeric id.
    fn id(&self) -> u64;

    /// System name.
    fn system_name(&self) -> &str;
}

/// Returns the items of `source` with no match in `target`, in source order.
///
/// Runs in `O(source * target)`; the collections involved are small.
pub fn missing<'a, S, T, F>(source: &'a [S], target: &[T], eq: F) -> Vec<&'a S>
where
    F: Fn(&S, &T) -> bool,
{
    source
        .iter()
        .filter(|item| !target.iter().any(|other| eq(item, other)))
        .collect()
}

/// Maps source ids to target ids for every system name present on both sides.
///
/// Used to translate metric references when copying mapping rules between
/// entities.
pub fn metrics_mapping<S, T>(source: &[S], target: &[T]) -> HashMap<u64, u64>
where
    S: SystemNamed,
    T: SystemNamed,
{
    source
        .iter()
        .filter_map(|a| {
            target
                .iter()
                .find(|b| a.system_name() == b.system_name())
                .map(|b| (a.id(), b.id()))
        })
        .collect()
}
