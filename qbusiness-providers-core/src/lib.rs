//! This crate provides the core logic of the Amazon Q Business resource providers:
//! - Tag merging, diffing and reconciliation for taggable resources
//! - Application policy parsing into Permission records, with statement lookup
//! - Q Business client integration and CloudFormation handler plumbing
//!

pub mod aws;
mod errors;
pub mod handlers;
pub mod policy;
mod service_configuration;
pub mod tags;

// Re-exports for a small, focused public API
pub use aws::qbusiness_client::AwsQBusinessClient;
pub use errors::{
    ErrorClassification, ProviderError, RemoteCallError, RemoteOperation, Result,
};
pub use policy::{
    find_by_statement_id, find_permission, parse, parse_permissions, project, Effect,
    PermissionRecord, PolicyStatement,
};
pub use service_configuration::{
    load_service_configuration, ResourceTypeSettings, ServiceConfiguration, DATA_ACCESSOR_TYPE,
    DATA_SOURCE_TYPE, PERMISSION_TYPE,
};
pub use tags::{
    diff, merge, reconcile, should_update, MergePrecedence, ReconcileOutcome, Tag, TagDiff,
    TagMap, TagOperations, TagSources,
};
