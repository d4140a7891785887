//! Tag merging, diffing and reconciliation.
//!
//! A resource's effective tags come from three sources: tags on the resource
//! model itself, stack-level tags CloudFormation propagates to every resource,
//! and AWS-managed system tags. The Update path merges each side (previous and
//! desired) into a single [`TagMap`], diffs them and applies the difference with
//! at most one untag and one tag call.

mod diff;
pub(crate) mod reconcile;

pub use diff::{diff, should_update, TagDiff};
pub use reconcile::{reconcile, ReconcileOutcome, TagOperations};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat tag key to value mapping
pub type TagMap = BTreeMap<String, String>;

/// Tag as it appears in a resource model's `Tags` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    /// Tag key
    #[new(into)]
    pub key: String,
    /// Tag value
    #[new(into)]
    pub value: String,
}

/// Convert a model tag list into a map; a repeated key keeps its last value
pub fn tags_to_map<'a>(tags: impl IntoIterator<Item = &'a Tag>) -> TagMap {
    tags.into_iter()
        .map(|tag| (tag.key.clone(), tag.value.clone()))
        .collect()
}

/// Convert a map back into a model tag list, ordered by key
#[must_use]
pub fn map_to_tags(tags: &TagMap) -> Vec<Tag> {
    tags.iter().map(|(key, value)| Tag::new(key, value)).collect()
}

/// Order in which tag sources overwrite each other on key collision.
///
/// The desired side and the previous side of an update are merged with
/// different orders; both are kept as observed in the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePrecedence {
    /// model, then system, then resource tags (resource tags win)
    #[default]
    Desired,
    /// system, then resource, then model tags (model tags win)
    Previous,
}

/// The three independent tag sources of one side of an update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TagSources {
    /// Tags attached directly to the resource model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_tags: Option<TagMap>,
    /// AWS-managed system tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_tags: Option<TagMap>,
    /// Stack-level tags propagated to all resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_tags: Option<TagMap>,
}

impl TagSources {
    /// Merge the sources into one map using the given precedence
    #[must_use]
    pub fn merged(&self, precedence: MergePrecedence) -> TagMap {
        let model = self.model_tags.as_ref();
        let system = self.system_tags.as_ref();
        let resource = self.resource_tags.as_ref();
        match precedence {
            MergePrecedence::Desired => merge_in_order([model, system, resource]),
            MergePrecedence::Previous => merge_in_order([system, resource, model]),
        }
    }
}

/// Merge model, system and resource tags; later sources win on collision.
///
/// Absent sources are treated as empty.
#[must_use]
pub fn merge(
    model_tags: Option<&TagMap>,
    system_tags: Option<&TagMap>,
    resource_tags: Option<&TagMap>,
) -> TagMap {
    merge_in_order([model_tags, system_tags, resource_tags])
}

fn merge_in_order<const N: usize>(sources: [Option<&TagMap>; N]) -> TagMap {
    let mut merged = TagMap::new();
    for source in sources.into_iter().flatten() {
        merged.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}
