use std::collections::BTreeSet;

use super::TagMap;

/// Minimal change set between two merged tag maps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    /// Keys that are new or whose value changed, with the desired value
    pub to_add: TagMap,
    /// Keys present before and absent now
    pub to_remove: BTreeSet<String>,
}

impl TagDiff {
    /// True when neither tags nor untags are needed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Whether the two maps differ at all.
///
/// Only a pre-check: a difference says nothing about which of the add and
/// remove sets is non-empty, so [`diff`] must still be computed.
#[must_use]
pub fn should_update(previous: &TagMap, desired: &TagMap) -> bool {
    previous != desired
}

/// Compute the add and remove sets that move `previous` to `desired`
#[must_use]
pub fn diff(previous: &TagMap, desired: &TagMap) -> TagDiff {
    let to_add = desired
        .iter()
        .filter(|(key, value)| previous.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let to_remove = previous
        .keys()
        .filter(|key| !desired.contains_key(*key))
        .cloned()
        .collect();

    TagDiff { to_add, to_remove }
}
