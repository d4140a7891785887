//! Resource type configuration loader with caching.
//!
//! This module loads the embedded description of the Q Business resource
//! types handled by this crate and caches it for the lifetime of the process.

use crate::errors::{ProviderError, Result};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{Arc, OnceLock},
};

/// CloudFormation type name of the DataAccessor resource
pub const DATA_ACCESSOR_TYPE: &str = "AWS::QBusiness::DataAccessor";
/// CloudFormation type name of the DataSource resource
pub const DATA_SOURCE_TYPE: &str = "AWS::QBusiness::DataSource";
/// CloudFormation type name of the Permission resource
pub const PERMISSION_TYPE: &str = "AWS::QBusiness::Permission";

const CONFIG_FILE: &str = "resource-types.json";

/// Settings for one resource type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceTypeSettings {
    /// Model properties forming the primary identifier
    pub primary_identifier: Vec<String>,
    /// Whether the resource supports TagResource/UntagResource
    pub taggable: bool,
}

/// Resource type configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceConfiguration {
    /// Settings keyed by CloudFormation type name
    pub resource_types: BTreeMap<String, ResourceTypeSettings>,
    /// Prefix of AWS-managed tag keys
    pub system_tag_prefix: String,
}

impl ServiceConfiguration {
    /// Settings for `type_name`, if it is a known resource type
    #[must_use]
    pub fn resource_type(&self, type_name: &str) -> Option<&ResourceTypeSettings> {
        self.resource_types.get(type_name)
    }

    /// Whether `type_name` is known and taggable
    #[must_use]
    pub fn is_taggable(&self, type_name: &str) -> bool {
        self.resource_type(type_name).is_some_and(|t| t.taggable)
    }

    /// Whether `key` is reserved for AWS-managed tags
    #[must_use]
    pub fn is_system_tag(&self, key: &str) -> bool {
        key.starts_with(&self.system_tag_prefix)
    }
}

/// Embedded resource type configuration data
#[derive(RustEmbed)]
#[folder = "resources/config"]
#[include = "resource-types.json"]
struct EmbeddedServiceConfig;

/// Static cache for the service configuration
static SERVICE_CONFIG_CACHE: OnceLock<Arc<ServiceConfiguration>> = OnceLock::new();

fn read_embedded_configuration() -> Result<ServiceConfiguration> {
    let embedded_file = EmbeddedServiceConfig::get(CONFIG_FILE).ok_or_else(|| {
        ProviderError::Configuration {
            message: format!("embedded {CONFIG_FILE} not found"),
            source: None,
        }
    })?;

    serde_json::from_slice(&embedded_file.data).map_err(|e| {
        ProviderError::configuration_with_source(format!("failed to parse {CONFIG_FILE}"), e)
    })
}

/// Load and cache the embedded service configuration
///
/// # Errors
/// Returns `ProviderError::Configuration` if the embedded file is missing or
/// does not match [`ServiceConfiguration`].
pub fn load_service_configuration() -> Result<Arc<ServiceConfiguration>> {
    if let Some(config) = SERVICE_CONFIG_CACHE.get() {
        return Ok(config.clone());
    }

    let config = Arc::new(read_embedded_configuration()?);
    log::debug!(
        "Loaded configuration for {} resource type(s)",
        config.resource_types.len()
    );
    Ok(SERVICE_CONFIG_CACHE.get_or_init(|| config).clone())
}
