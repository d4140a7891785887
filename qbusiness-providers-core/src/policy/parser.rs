use std::collections::BTreeMap;

use log::{debug, trace};
use serde::Deserialize;

use super::{Effect, PermissionRecord, PolicyStatement};
use crate::errors::{ProviderError, Result};

/// Policy document as it appears on the wire
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPolicyDocument {
    #[serde(default)]
    #[allow(dead_code)]
    version: Option<String>,
    statement: Vec<RawStatement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawStatement {
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    effect: Option<Effect>,
    #[serde(default)]
    principal: Option<RawPrincipal>,
    #[serde(default)]
    action: Option<OneOrMany>,
    #[serde(default)]
    resource: Option<OneOrMany>,
}

/// A single string or a list of strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// `"arn"`, `["arn", ...]` or `{ "AWS": "arn" | ["arn", ...], ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrincipal {
    Id(String),
    Ids(Vec<String>),
    ByKind(BTreeMap<String, OneOrMany>),
}

impl RawPrincipal {
    /// Distinct principal ids, in first-seen order
    fn distinct_ids(self) -> Vec<String> {
        let ids = match self {
            Self::Id(id) => vec![id],
            Self::Ids(ids) => ids,
            Self::ByKind(by_kind) => by_kind
                .into_values()
                .flat_map(OneOrMany::into_vec)
                .collect(),
        };

        let mut distinct: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !distinct.contains(&id) {
                distinct.push(id);
            }
        }
        distinct
    }
}

/// Parse a policy document into statements, in document order.
///
/// Fails with `MalformedPolicy` when the text is not JSON or has no
/// `Statement` array, and with `InvalidStatementPrincipalCount` when a
/// statement does not resolve to exactly one principal. No partial list is
/// returned on failure.
pub fn parse(policy_json: &str) -> Result<Vec<PolicyStatement>> {
    let document: RawPolicyDocument = serde_json::from_str(policy_json)
        .map_err(|e| ProviderError::malformed_policy_with_source("invalid policy JSON", e))?;

    let statements = document
        .statement
        .into_iter()
        .enumerate()
        .map(|(index, raw)| decode_statement(index, raw))
        .collect::<Result<Vec<_>>>()?;

    debug!("Parsed {} policy statement(s)", statements.len());
    Ok(statements)
}

fn decode_statement(index: usize, raw: RawStatement) -> Result<PolicyStatement> {
    let sid = raw
        .sid
        .ok_or_else(|| ProviderError::malformed_policy(format!("statement {index} has no Sid")))?;

    let actions = raw
        .action
        .map(OneOrMany::into_vec)
        .ok_or_else(|| ProviderError::malformed_policy(format!("statement '{sid}' has no Action")))?;

    let mut principals = raw.principal.map(RawPrincipal::distinct_ids).unwrap_or_default();
    if principals.len() != 1 {
        return Err(ProviderError::invalid_principal_count(sid, principals.len()));
    }
    let principal = principals.remove(0);

    trace!("Decoded statement '{}' for principal {}", sid, principal);

    Ok(PolicyStatement {
        sid,
        effect: raw.effect,
        principal,
        actions,
        resources: raw.resource.map(OneOrMany::into_vec).unwrap_or_default(),
    })
}

/// Project statements into permission records for `application_id`
#[must_use]
pub fn project(application_id: &str, statements: &[PolicyStatement]) -> Vec<PermissionRecord> {
    statements
        .iter()
        .map(|statement| PermissionRecord::from_statement(application_id, statement))
        .collect()
}

/// Parse an optional policy text straight into permission records.
///
/// The policy text is required; `None` is an `InvalidArgument`.
pub fn parse_permissions(
    application_id: &str,
    policy_json: Option<&str>,
) -> Result<Vec<PermissionRecord>> {
    let policy_json = policy_json.ok_or_else(|| ProviderError::invalid_argument("policy"))?;
    Ok(project(application_id, &parse(policy_json)?))
}
