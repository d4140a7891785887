use std::collections::BTreeSet;

use async_trait::async_trait;
use log::{debug, info};

use super::{diff, MergePrecedence, TagMap, TagSources};
use crate::errors::{ProviderError, RemoteCallError, RemoteOperation, Result};

/// Remote tag mutations scoped to a resource ARN.
///
/// Implementations classify their own failures; the reconciler passes the
/// [`RemoteCallError`] through unchanged.
#[async_trait]
pub trait TagOperations: Send + Sync {
    /// Add or overwrite the given tags
    async fn tag_resource(
        &self,
        resource_arn: &str,
        tags: &TagMap,
    ) -> std::result::Result<(), RemoteCallError>;

    /// Remove the given tag keys
    async fn untag_resource(
        &self,
        resource_arn: &str,
        tag_keys: &BTreeSet<String>,
    ) -> std::result::Result<(), RemoteCallError>;
}

/// What a successful reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Keys removed by the untag call
    pub removed: BTreeSet<String>,
    /// Tags written by the tag call
    pub added: TagMap,
}

impl ReconcileOutcome {
    /// True when no remote call was made
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Move the remote tags of `resource_arn` from `previous` to `desired`.
///
/// Issues at most one untag call followed by at most one tag call. If the
/// untag call fails the tag call is not attempted. Nothing is retried here.
///
/// `previous` is merged with [`MergePrecedence::Previous`] (model tags win)
/// and `desired` with [`MergePrecedence::Desired`] (stack tags win). When a
/// model tag and a stack tag share a key with different values, identical
/// sources on both sides still produce a tag call writing the stack value.
pub async fn reconcile<T>(
    operations: &T,
    resource_arn: &str,
    previous: &TagSources,
    desired: &TagSources,
) -> Result<ReconcileOutcome>
where
    T: TagOperations + ?Sized,
{
    let previous_tags = previous.merged(MergePrecedence::Previous);
    let desired_tags = desired.merged(MergePrecedence::Desired);

    let changes = diff(&previous_tags, &desired_tags);
    debug!(
        "Tag diff for {}: {} to add, {} to remove",
        resource_arn,
        changes.to_add.len(),
        changes.to_remove.len()
    );

    if changes.is_empty() {
        debug!("Tags of {} are up to date", resource_arn);
        return Ok(ReconcileOutcome::default());
    }

    if !changes.to_remove.is_empty() {
        info!(
            "Removing tags {:?} from {}",
            changes.to_remove, resource_arn
        );
        operations
            .untag_resource(resource_arn, &changes.to_remove)
            .await
            .map_err(|e| ProviderError::remote_call(RemoteOperation::Untag, resource_arn, e))?;
    }

    if !changes.to_add.is_empty() {
        info!(
            "Applying {} tag(s) to {}",
            changes.to_add.len(),
            resource_arn
        );
        operations
            .tag_resource(resource_arn, &changes.to_add)
            .await
            .map_err(|e| ProviderError::remote_call(RemoteOperation::Tag, resource_arn, e))?;
    }

    Ok(ReconcileOutcome {
        removed: changes.to_remove,
        added: changes.to_add,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::ErrorClassification;
    use std::sync::Mutex;

    const ARN: &str = "arn:aws:qbusiness:us-east-1:123456789012:application/app/data-accessor/da";

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Tag(String, TagMap),
        Untag(String, BTreeSet<String>),
    }

    /// Records every call; optionally fails one of the two operations
    #[derive(Default)]
    pub(crate) struct RecordingTagOperations {
        pub(crate) calls: Mutex<Vec<Call>>,
        pub(crate) fail_tag: Option<RemoteCallError>,
        pub(crate) fail_untag: Option<RemoteCallError>,
    }

    impl RecordingTagOperations {
        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().expect("lock poisoned").clone()
        }
    }

    #[async_trait]
    impl TagOperations for RecordingTagOperations {
        async fn tag_resource(
            &self,
            resource_arn: &str,
            tags: &TagMap,
        ) -> std::result::Result<(), RemoteCallError> {
            self.calls
                .lock()
                .expect("lock poisoned")
                .push(Call::Tag(resource_arn.to_string(), tags.clone()));
            self.fail_tag.clone().map_or(Ok(()), Err)
        }

        async fn untag_resource(
            &self,
            resource_arn: &str,
            tag_keys: &BTreeSet<String>,
        ) -> std::result::Result<(), RemoteCallError> {
            self.calls
                .lock()
                .expect("lock poisoned")
                .push(Call::Untag(resource_arn.to_string(), tag_keys.clone()));
            self.fail_untag.clone().map_or(Ok(()), Err)
        }
    }

    fn tag_map(entries: &[(&str, &str)]) -> TagMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn resource_tags(entries: &[(&str, &str)]) -> TagSources {
        TagSources {
            resource_tags: Some(tag_map(entries)),
            ..TagSources::default()
        }
    }

    fn keys(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| (*k).to_string()).collect()
    }

    #[tokio::test]
    async fn test_unchanged_tags_make_no_calls() {
        let ops = RecordingTagOperations::default();
        let sources = resource_tags(&[("a", "1")]);

        let outcome = reconcile(&ops, ARN, &sources, &sources)
            .await
            .expect("reconcile should succeed");

        assert!(outcome.is_noop());
        assert!(ops.calls().is_empty());
    }

    #[tokio::test]
    async fn test_only_additions_call_tag_only() {
        let ops = RecordingTagOperations::default();
        let previous = resource_tags(&[("stackTagA", "v1")]);
        let desired = resource_tags(&[("stackTagA", "v2"), ("stackTagB", "v3")]);

        let outcome = reconcile(&ops, ARN, &previous, &desired)
            .await
            .expect("reconcile should succeed");

        let expected = tag_map(&[("stackTagA", "v2"), ("stackTagB", "v3")]);
        assert_eq!(ops.calls(), vec![Call::Tag(ARN.to_string(), expected.clone())]);
        assert_eq!(outcome.added, expected);
        assert!(outcome.removed.is_empty());
    }

    #[tokio::test]
    async fn test_only_removals_call_untag_only() {
        let ops = RecordingTagOperations::default();
        let previous = resource_tags(&[("a", "1"), ("b", "2")]);
        let desired = resource_tags(&[("a", "1")]);

        reconcile(&ops, ARN, &previous, &desired)
            .await
            .expect("reconcile should succeed");

        assert_eq!(ops.calls(), vec![Call::Untag(ARN.to_string(), keys(&["b"]))]);
    }

    #[test_log::test(tokio::test)]
    async fn test_untag_runs_before_tag() {
        let ops = RecordingTagOperations::default();
        let previous = resource_tags(&[("old", "1")]);
        let desired = resource_tags(&[("new", "2")]);

        reconcile(&ops, ARN, &previous, &desired)
            .await
            .expect("reconcile should succeed");

        assert_eq!(
            ops.calls(),
            vec![
                Call::Untag(ARN.to_string(), keys(&["old"])),
                Call::Tag(ARN.to_string(), tag_map(&[("new", "2")])),
            ]
        );
    }

    #[tokio::test]
    async fn test_untag_failure_short_circuits() {
        let ops = RecordingTagOperations {
            fail_untag: Some(RemoteCallError::new(
                ErrorClassification::AccessDenied,
                "not authorized to perform qbusiness:UntagResource",
            )),
            ..RecordingTagOperations::default()
        };
        let previous = resource_tags(&[("old", "1")]);
        let desired = resource_tags(&[("new", "2")]);

        let error = reconcile(&ops, ARN, &previous, &desired)
            .await
            .expect_err("untag failure should surface");

        assert_eq!(ops.calls(), vec![Call::Untag(ARN.to_string(), keys(&["old"]))]);
        assert_eq!(error.classification(), Some(ErrorClassification::AccessDenied));
        match error {
            ProviderError::RemoteCallFailure {
                operation, source, ..
            } => {
                assert_eq!(operation, RemoteOperation::Untag);
                assert_eq!(
                    source.message,
                    "not authorized to perform qbusiness:UntagResource"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tag_failure_after_untag_reports_tag_operation() {
        let ops = RecordingTagOperations {
            fail_tag: Some(RemoteCallError::new(
                ErrorClassification::Throttling,
                "Rate exceeded",
            )),
            ..RecordingTagOperations::default()
        };
        let previous = resource_tags(&[("old", "1")]);
        let desired = resource_tags(&[("new", "2")]);

        let error = reconcile(&ops, ARN, &previous, &desired)
            .await
            .expect_err("tag failure should surface");

        assert_eq!(ops.calls().len(), 2);
        assert!(matches!(
            error,
            ProviderError::RemoteCallFailure {
                operation: RemoteOperation::Tag,
                ..
            }
        ));
        assert_eq!(error.classification(), Some(ErrorClassification::Throttling));
    }

    #[tokio::test]
    async fn test_sides_are_merged_with_their_own_precedence() {
        let ops = RecordingTagOperations::default();
        // Previous side: model tags win over stack tags
        let previous = TagSources {
            model_tags: Some(tag_map(&[("k", "v")])),
            resource_tags: Some(tag_map(&[("k", "stack")])),
            ..TagSources::default()
        };
        // Desired side: stack tags win over model tags
        let desired = TagSources {
            model_tags: Some(tag_map(&[("k", "stack")])),
            resource_tags: Some(tag_map(&[("k", "v")])),
            ..TagSources::default()
        };

        let outcome = reconcile(&ops, ARN, &previous, &desired)
            .await
            .expect("reconcile should succeed");

        assert!(outcome.is_noop());
        assert!(ops.calls().is_empty());
    }

    #[tokio::test]
    async fn test_identical_sources_with_shared_key_write_stack_value() {
        let ops = RecordingTagOperations::default();
        let sources = TagSources {
            model_tags: Some(tag_map(&[("k", "model"), ("m", "1")])),
            resource_tags: Some(tag_map(&[("k", "stack")])),
            ..TagSources::default()
        };

        let outcome = reconcile(&ops, ARN, &sources, &sources)
            .await
            .expect("reconcile should succeed");

        assert_eq!(
            ops.calls(),
            vec![Call::Tag(ARN.to_string(), tag_map(&[("k", "stack")]))]
        );
        assert!(outcome.removed.is_empty());
    }
}
