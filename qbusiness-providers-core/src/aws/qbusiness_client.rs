use std::collections::BTreeSet;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_qbusiness::{types::Tag as SdkTag, Client as QBusinessClient};
use log::debug;

use crate::aws::classify_sdk_error;
use crate::errors::{ErrorClassification, RemoteCallError};
use crate::handlers::{PermissionOperations, TagReader};
use crate::tags::{TagMap, TagOperations};

/// Client to call Amazon Q Business
pub struct AwsQBusinessClient {
    pub(crate) client: QBusinessClient,
}

/// Impl for Amazon Q Business client wrapper
impl AwsQBusinessClient {
    /// New construct
    pub fn new(client: QBusinessClient) -> Self {
        Self { client }
    }

    /// Build a client from the standard credential provider chain, optionally
    /// overriding the region
    pub async fn from_env(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let config = loader.load().await;

        Self::new(QBusinessClient::new(&config))
    }
}

fn to_sdk_tags(tags: &TagMap) -> Result<Vec<SdkTag>, RemoteCallError> {
    tags.iter()
        .map(|(key, value)| {
            SdkTag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| {
                    RemoteCallError::new(
                        ErrorClassification::Validation,
                        format!("Invalid tag '{key}': {e}"),
                    )
                })
        })
        .collect()
}

#[async_trait]
impl TagOperations for AwsQBusinessClient {
    async fn tag_resource(
        &self,
        resource_arn: &str,
        tags: &TagMap,
    ) -> Result<(), RemoteCallError> {
        debug!("TagResource {} ({} tag(s))", resource_arn, tags.len());
        self.client
            .tag_resource()
            .resource_arn(resource_arn)
            .set_tags(Some(to_sdk_tags(tags)?))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;
        Ok(())
    }

    async fn untag_resource(
        &self,
        resource_arn: &str,
        tag_keys: &BTreeSet<String>,
    ) -> Result<(), RemoteCallError> {
        debug!("UntagResource {} ({:?})", resource_arn, tag_keys);
        self.client
            .untag_resource()
            .resource_arn(resource_arn)
            .set_tag_keys(Some(tag_keys.iter().cloned().collect()))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;
        Ok(())
    }
}

#[async_trait]
impl TagReader for AwsQBusinessClient {
    async fn list_tags(&self, resource_arn: &str) -> Result<TagMap, RemoteCallError> {
        let out = self
            .client
            .list_tags_for_resource()
            .resource_arn(resource_arn)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        Ok(out
            .tags()
            .iter()
            .map(|tag| (tag.key().to_string(), tag.value().to_string()))
            .collect())
    }
}

#[async_trait]
impl PermissionOperations for AwsQBusinessClient {
    async fn get_policy(&self, application_id: &str) -> Result<Option<String>, RemoteCallError> {
        let out = self
            .client
            .get_policy()
            .application_id(application_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        Ok(out.policy().map(ToString::to_string))
    }

    async fn associate_permission(
        &self,
        application_id: &str,
        statement_id: &str,
        actions: &[String],
        principal: &str,
    ) -> Result<(), RemoteCallError> {
        debug!(
            "AssociatePermission {} on {} for {}",
            statement_id, application_id, principal
        );
        self.client
            .associate_permission()
            .application_id(application_id)
            .statement_id(statement_id)
            .set_actions(Some(actions.to_vec()))
            .principal(principal)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;
        Ok(())
    }

    async fn disassociate_permission(
        &self,
        application_id: &str,
        statement_id: &str,
    ) -> Result<(), RemoteCallError> {
        debug!(
            "DisassociatePermission {} on {}",
            statement_id, application_id
        );
        self.client
            .disassociate_permission()
            .application_id(application_id)
            .statement_id(statement_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_sdk_tags_preserves_pairs_in_key_order() {
        let tags: TagMap = [("stackTagB", "v3"), ("stackTagA", "v2"), ("empty", "")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let sdk_tags = to_sdk_tags(&tags).expect("tags should build");

        let pairs: Vec<(&str, &str)> = sdk_tags.iter().map(|t| (t.key(), t.value())).collect();
        assert_eq!(
            pairs,
            vec![("empty", ""), ("stackTagA", "v2"), ("stackTagB", "v3")]
        );
    }

    #[test]
    fn test_to_sdk_tags_empty_map() {
        assert!(to_sdk_tags(&TagMap::new()).expect("tags should build").is_empty());
    }
}
