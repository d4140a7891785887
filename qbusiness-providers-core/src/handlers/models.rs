use serde::{Deserialize, Serialize};

use crate::policy::PermissionRecord;
use crate::service_configuration::{DATA_ACCESSOR_TYPE, DATA_SOURCE_TYPE, PERMISSION_TYPE};
use crate::tags::Tag;

/// Resource model whose tags are reconciled on update
pub trait TaggedModel {
    /// CloudFormation type name
    const TYPE_NAME: &'static str;

    /// ARN used to scope tag calls
    fn arn(&self) -> Option<&str>;

    /// Tags attached to the model
    fn tags(&self) -> Option<&[Tag]>;
}

/// `AWS::QBusiness::DataAccessor` identifying fields and tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataAccessorModel {
    /// Application the data accessor belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    /// Data accessor identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_accessor_id: Option<String>,
    /// ARN used to scope tag calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_accessor_arn: Option<String>,
    /// Tags attached to the data accessor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

impl TaggedModel for DataAccessorModel {
    const TYPE_NAME: &'static str = DATA_ACCESSOR_TYPE;

    fn arn(&self) -> Option<&str> {
        self.data_accessor_arn.as_deref()
    }

    fn tags(&self) -> Option<&[Tag]> {
        self.tags.as_deref()
    }
}

/// `AWS::QBusiness::DataSource` identifying fields and tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSourceModel {
    /// Application the data source belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    /// Index the data source feeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_id: Option<String>,
    /// Data source identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<String>,
    /// ARN used to scope tag calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_arn: Option<String>,
    /// Tags attached to the data source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

impl TaggedModel for DataSourceModel {
    const TYPE_NAME: &'static str = DATA_SOURCE_TYPE;

    fn arn(&self) -> Option<&str> {
        self.data_source_arn.as_deref()
    }

    fn tags(&self) -> Option<&[Tag]> {
        self.tags.as_deref()
    }
}

/// `AWS::QBusiness::Permission` model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionModel {
    /// Application whose policy holds the statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    /// Sid of the policy statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_id: Option<String>,
    /// Actions granted to the principal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    /// The single principal the statement grants to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
}

impl PermissionModel {
    /// CloudFormation type name
    pub const TYPE_NAME: &'static str = PERMISSION_TYPE;
}

impl From<PermissionRecord> for PermissionModel {
    fn from(record: PermissionRecord) -> Self {
        Self {
            application_id: Some(record.application_id),
            statement_id: Some(record.statement_id),
            actions: Some(record.actions),
            principal: Some(record.principal),
        }
    }
}
