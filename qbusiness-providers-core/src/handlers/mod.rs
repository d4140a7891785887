//! CloudFormation handler plumbing for the Q Business resource types.
//!
//! Handlers take a [`ResourceHandlerRequest`] and always answer with a
//! [`ProgressEvent`]; failures become a `FAILED` event carrying a
//! [`HandlerErrorCode`] rather than an `Err`.

mod models;
mod permission;
mod tagging;

pub use models::{DataAccessorModel, DataSourceModel, PermissionModel, TaggedModel};
pub use permission::{PermissionHandler, PermissionOperations};
pub use tagging::{read_tags, update_tags, TagReader};

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorClassification, ProviderError};
use crate::tags::{tags_to_map, TagMap, TagSources};

/// CloudFormation handler error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandlerErrorCode {
    /// The caller lacks permissions
    AccessDenied,
    /// The request was throttled
    Throttling,
    /// The resource is being modified concurrently
    ResourceConflict,
    /// The resource does not exist
    NotFound,
    /// The request is invalid
    InvalidRequest,
    /// A service limit was reached
    ServiceLimitExceeded,
    /// Unclassified downstream failure
    GeneralServiceException,
    /// Unexpected failure inside the handler
    InternalFailure,
    /// The resource already exists
    AlreadyExists,
}

impl HandlerErrorCode {
    /// Whether CloudFormation may retry the handler for this code
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Throttling | Self::GeneralServiceException)
    }
}

impl From<ErrorClassification> for HandlerErrorCode {
    fn from(classification: ErrorClassification) -> Self {
        match classification {
            ErrorClassification::AccessDenied => Self::AccessDenied,
            ErrorClassification::Throttling => Self::Throttling,
            ErrorClassification::Conflict => Self::ResourceConflict,
            ErrorClassification::NotFound => Self::NotFound,
            ErrorClassification::Validation => Self::InvalidRequest,
            ErrorClassification::QuotaExceeded => Self::ServiceLimitExceeded,
            ErrorClassification::Generic => Self::GeneralServiceException,
        }
    }
}

impl From<&ProviderError> for HandlerErrorCode {
    fn from(error: &ProviderError) -> Self {
        match error {
            ProviderError::RemoteCallFailure { source, .. } => source.classification.into(),
            ProviderError::InvalidArgument { .. } => Self::InvalidRequest,
            ProviderError::MalformedPolicy { .. }
            | ProviderError::InvalidStatementPrincipalCount { .. }
            | ProviderError::Configuration { .. } => Self::InternalFailure,
        }
    }
}

/// Final status of a handler invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// The operation completed
    Success,
    /// The operation failed
    Failed,
}

/// Handler response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent<M> {
    /// Outcome
    pub status: OperationStatus,
    /// Error code of a failed event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<HandlerErrorCode>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Single model (Create/Read/Update)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_model: Option<M>,
    /// Model list (List)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_models: Option<Vec<M>>,
}

impl<M> ProgressEvent<M> {
    /// Successful event carrying a model
    pub const fn success(model: M) -> Self {
        Self {
            status: OperationStatus::Success,
            error_code: None,
            message: None,
            resource_model: Some(model),
            resource_models: None,
        }
    }

    /// Successful event without a model (Delete)
    pub const fn success_empty() -> Self {
        Self {
            status: OperationStatus::Success,
            error_code: None,
            message: None,
            resource_model: None,
            resource_models: None,
        }
    }

    /// Successful List event
    pub const fn success_list(models: Vec<M>) -> Self {
        Self {
            status: OperationStatus::Success,
            error_code: None,
            message: None,
            resource_model: None,
            resource_models: Some(models),
        }
    }

    /// Failed event
    pub fn failed(error_code: HandlerErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Failed,
            error_code: Some(error_code),
            message: Some(message.into()),
            resource_model: None,
            resource_models: None,
        }
    }

    /// Failed event for a core error
    pub fn from_error(error: &ProviderError) -> Self {
        log::warn!("Handler failed: {}", error);
        Self::failed(HandlerErrorCode::from(error), error.to_string())
    }

    /// Whether the event is a success
    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }
}

/// Handler request as delivered by CloudFormation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHandlerRequest<M> {
    /// Desired resource model
    #[serde(default)]
    pub desired_resource_state: Option<M>,
    /// Resource model before the update
    #[serde(default)]
    pub previous_resource_state: Option<M>,
    /// Desired stack-level tags
    #[serde(default)]
    pub desired_resource_tags: Option<TagMap>,
    /// Stack-level tags before the update
    #[serde(default)]
    pub previous_resource_tags: Option<TagMap>,
    /// Desired system tags
    #[serde(default)]
    pub system_tags: Option<TagMap>,
    /// System tags before the update
    #[serde(default)]
    pub previous_system_tags: Option<TagMap>,
    /// Continuation token of a List request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl<M: TaggedModel> ResourceHandlerRequest<M> {
    /// Tag sources of the desired side
    pub fn desired_tag_sources(&self) -> TagSources {
        TagSources {
            model_tags: self
                .desired_resource_state
                .as_ref()
                .and_then(TaggedModel::tags)
                .map(tags_to_map),
            system_tags: self.system_tags.clone(),
            resource_tags: self.desired_resource_tags.clone(),
        }
    }

    /// Tag sources of the previous side
    pub fn previous_tag_sources(&self) -> TagSources {
        TagSources {
            model_tags: self
                .previous_resource_state
                .as_ref()
                .and_then(TaggedModel::tags)
                .map(tags_to_map),
            system_tags: self.previous_system_tags.clone(),
            resource_tags: self.previous_resource_tags.clone(),
        }
    }
}
