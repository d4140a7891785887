//! Q Business application policy documents.
//!
//! `GetPolicy` returns the application's resource policy as an IAM-style JSON
//! document. Each statement of that document is one `Permission` resource, so
//! the document is decoded into flat statements and projected into
//! [`PermissionRecord`]s. Only the fields the Permission model uses are
//! decoded; anything else (Condition, NotAction, ...) is ignored.

mod lookup;
mod parser;

pub use lookup::{find_by_statement_id, find_permission};
pub use parser::{parse, parse_permissions, project};

use serde::{Deserialize, Serialize};

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Allow
    Allow,
    /// Deny
    Deny,
}

/// One decoded policy statement with its principal already resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// Statement id (`Sid`)
    pub sid: String,
    /// `Effect`, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
    /// The single principal the statement applies to
    pub principal: String,
    /// Actions in document order
    pub actions: Vec<String>,
    /// Resources in document order, not interpreted
    pub resources: Vec<String>,
}

/// Flat projection of a statement, as exposed by the Permission resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionRecord {
    /// Application the policy belongs to
    #[new(into)]
    pub application_id: String,
    /// Statement id
    #[new(into)]
    pub statement_id: String,
    /// Principal ARN
    #[new(into)]
    pub principal: String,
    /// Actions in document order
    pub actions: Vec<String>,
}

impl PermissionRecord {
    /// Project a statement for the given application
    #[must_use]
    pub fn from_statement(application_id: &str, statement: &PolicyStatement) -> Self {
        Self::new(
            application_id,
            statement.sid.clone(),
            statement.principal.clone(),
            statement.actions.clone(),
        )
    }
}
