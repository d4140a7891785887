use async_trait::async_trait;
use log::info;

use super::{HandlerErrorCode, ProgressEvent, ResourceHandlerRequest, TaggedModel};
use crate::errors::{ProviderError, RemoteCallError, RemoteOperation, Result};
use crate::service_configuration::load_service_configuration;
use crate::tags::{map_to_tags, reconcile, Tag, TagMap, TagOperations};

/// Read access to a resource's current tags
#[async_trait]
pub trait TagReader: Send + Sync {
    /// All tags currently on the resource, system tags included
    async fn list_tags(&self, resource_arn: &str) -> std::result::Result<TagMap, RemoteCallError>;
}

/// Tag step of the Update handler for taggable resource types.
///
/// Reconciles the previous side of the request against the desired side and
/// returns the desired model on success.
pub async fn update_tags<M, T>(operations: &T, request: &ResourceHandlerRequest<M>) -> ProgressEvent<M>
where
    M: TaggedModel + Clone + Send + Sync,
    T: TagOperations + ?Sized,
{
    let config = match load_service_configuration() {
        Ok(config) => config,
        Err(e) => return ProgressEvent::from_error(&e),
    };
    if !config.is_taggable(M::TYPE_NAME) {
        return ProgressEvent::failed(
            HandlerErrorCode::InvalidRequest,
            format!("{} does not support tagging", M::TYPE_NAME),
        );
    }

    let Some(desired) = request.desired_resource_state.as_ref() else {
        return ProgressEvent::failed(
            HandlerErrorCode::InvalidRequest,
            "desiredResourceState is required",
        );
    };

    let arn = desired
        .arn()
        .or_else(|| request.previous_resource_state.as_ref().and_then(TaggedModel::arn));
    let Some(arn) = arn else {
        return ProgressEvent::failed(
            HandlerErrorCode::InvalidRequest,
            format!("{} ARN is required to update tags", M::TYPE_NAME),
        );
    };

    match reconcile(
        operations,
        arn,
        &request.previous_tag_sources(),
        &request.desired_tag_sources(),
    )
    .await
    {
        Ok(outcome) => {
            if !outcome.is_noop() {
                info!(
                    "Updated tags of {} {}: {} added, {} removed",
                    M::TYPE_NAME,
                    arn,
                    outcome.added.len(),
                    outcome.removed.len()
                );
            }
            ProgressEvent::success(desired.clone())
        }
        Err(e) => ProgressEvent::from_error(&e),
    }
}

/// Current user tags of a resource, for the Read handler.
///
/// AWS-managed tags are dropped; no tags at all reads as `None`.
pub async fn read_tags<T>(reader: &T, resource_arn: &str) -> Result<Option<Vec<Tag>>>
where
    T: TagReader + ?Sized,
{
    let config = load_service_configuration()?;
    let tags: TagMap = reader
        .list_tags(resource_arn)
        .await
        .map_err(|e| ProviderError::remote_call(RemoteOperation::ListTags, resource_arn, e))?
        .into_iter()
        .filter(|(key, _)| !config.is_system_tag(key))
        .collect();

    Ok((!tags.is_empty()).then(|| map_to_tags(&tags)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorClassification;
    use crate::handlers::{DataAccessorModel, DataSourceModel, OperationStatus, PermissionModel};
    use crate::tags::reconcile::tests::{Call, RecordingTagOperations};
    use std::collections::BTreeSet;

    const ARN: &str = "arn:aws:qbusiness:us-east-1:123456789012:application/app/data-accessor/da";

    fn tag_map(entries: &[(&str, &str)]) -> TagMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn accessor(arn: Option<&str>, tags: &[(&str, &str)]) -> DataAccessorModel {
        DataAccessorModel {
            application_id: Some("app".to_string()),
            data_accessor_id: Some("da".to_string()),
            data_accessor_arn: arn.map(ToString::to_string),
            tags: Some(tags.iter().map(|(k, v)| Tag::new(*k, *v)).collect()),
        }
    }

    struct StaticTags(TagMap);

    #[async_trait]
    impl TagReader for StaticTags {
        async fn list_tags(&self, _resource_arn: &str) -> std::result::Result<TagMap, RemoteCallError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_update_applies_model_and_stack_tag_changes() {
        let ops = RecordingTagOperations::default();
        let request = ResourceHandlerRequest {
            previous_resource_state: Some(accessor(Some(ARN), &[("owner", "a"), ("gone", "x")])),
            desired_resource_state: Some(accessor(Some(ARN), &[("owner", "b")])),
            previous_resource_tags: Some(tag_map(&[("stack", "1")])),
            desired_resource_tags: Some(tag_map(&[("stack", "1")])),
            ..ResourceHandlerRequest::default()
        };

        let event = update_tags(&ops, &request).await;

        assert_eq!(event.status, OperationStatus::Success);
        assert_eq!(event.resource_model, request.desired_resource_state);
        assert_eq!(
            ops.calls(),
            vec![
                Call::Untag(ARN.to_string(), BTreeSet::from(["gone".to_string()])),
                Call::Tag(ARN.to_string(), tag_map(&[("owner", "b")])),
            ]
        );
    }

    #[tokio::test]
    async fn test_update_without_changes_makes_no_calls() {
        let ops = RecordingTagOperations::default();
        let model = accessor(Some(ARN), &[("owner", "a")]);
        let request = ResourceHandlerRequest {
            previous_resource_state: Some(model.clone()),
            desired_resource_state: Some(model),
            system_tags: Some(tag_map(&[("aws:cloudformation:stack-name", "demo")])),
            previous_system_tags: Some(tag_map(&[("aws:cloudformation:stack-name", "demo")])),
            ..ResourceHandlerRequest::default()
        };

        let event = update_tags(&ops, &request).await;

        assert!(event.is_success());
        assert!(ops.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_uses_previous_arn_when_desired_has_none() {
        let ops = RecordingTagOperations::default();
        let request = ResourceHandlerRequest {
            previous_resource_state: Some(DataSourceModel {
                data_source_arn: Some(ARN.to_string()),
                ..DataSourceModel::default()
            }),
            desired_resource_state: Some(DataSourceModel {
                tags: Some(vec![Tag::new("k", "v")]),
                ..DataSourceModel::default()
            }),
            ..ResourceHandlerRequest::default()
        };

        let event = update_tags(&ops, &request).await;

        assert!(event.is_success());
        assert_eq!(
            ops.calls(),
            vec![Call::Tag(ARN.to_string(), tag_map(&[("k", "v")]))]
        );
    }

    #[tokio::test]
    async fn test_update_without_arn_is_invalid_request() {
        let ops = RecordingTagOperations::default();
        let request = ResourceHandlerRequest {
            desired_resource_state: Some(accessor(None, &[("k", "v")])),
            ..ResourceHandlerRequest::default()
        };

        let event = update_tags(&ops, &request).await;

        assert_eq!(event.error_code, Some(HandlerErrorCode::InvalidRequest));
        assert!(ops.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_failure_maps_classification() {
        let ops = RecordingTagOperations {
            fail_tag: Some(RemoteCallError::new(
                ErrorClassification::Throttling,
                "Rate exceeded",
            )),
            ..RecordingTagOperations::default()
        };
        let request = ResourceHandlerRequest {
            previous_resource_state: Some(accessor(Some(ARN), &[])),
            desired_resource_state: Some(accessor(Some(ARN), &[("k", "v")])),
            ..ResourceHandlerRequest::default()
        };

        let event = update_tags(&ops, &request).await;

        assert_eq!(event.status, OperationStatus::Failed);
        assert_eq!(event.error_code, Some(HandlerErrorCode::Throttling));
        assert!(event.message.unwrap_or_default().contains("Rate exceeded"));
    }

    #[tokio::test]
    async fn test_update_rejects_untaggable_type() {
        #[derive(Clone, Default)]
        struct UntaggedPermission(PermissionModel);

        impl TaggedModel for UntaggedPermission {
            const TYPE_NAME: &'static str = PermissionModel::TYPE_NAME;

            fn arn(&self) -> Option<&str> {
                Some(ARN)
            }

            fn tags(&self) -> Option<&[Tag]> {
                None
            }
        }

        let ops = RecordingTagOperations::default();
        let request = ResourceHandlerRequest {
            desired_resource_state: Some(UntaggedPermission::default()),
            ..ResourceHandlerRequest::default()
        };

        let event = update_tags(&ops, &request).await;

        assert_eq!(event.error_code, Some(HandlerErrorCode::InvalidRequest));
    }

    #[tokio::test]
    async fn test_read_tags_drops_system_tags() {
        let reader = StaticTags(tag_map(&[
            ("aws:cloudformation:stack-id", "id"),
            ("team", "search"),
        ]));

        let tags = read_tags(&reader, ARN).await.expect("read should succeed");

        assert_eq!(tags, Some(vec![Tag::new("team", "search")]));
    }

    #[tokio::test]
    async fn test_read_tags_only_system_tags_is_none() {
        let reader = StaticTags(tag_map(&[("aws:cloudformation:stack-id", "id")]));

        let tags = read_tags(&reader, ARN).await.expect("read should succeed");

        assert!(tags.is_none());
    }
}
