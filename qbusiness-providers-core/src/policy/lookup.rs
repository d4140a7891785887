use super::{parse, PermissionRecord, PolicyStatement};
use crate::errors::{ProviderError, Result};

/// Find the first statement whose `Sid` equals `statement_id`.
///
/// A missing id is an `InvalidArgument`; a miss is `Ok(None)` and the caller
/// decides whether that is terminal.
pub fn find_by_statement_id<'a>(
    statements: &'a [PolicyStatement],
    statement_id: Option<&str>,
) -> Result<Option<&'a PolicyStatement>> {
    let statement_id = statement_id.ok_or_else(|| ProviderError::invalid_argument("statementId"))?;
    Ok(statements.iter().find(|s| s.sid == statement_id))
}

/// Parse `policy_json` and project the statement with `statement_id`, if any
pub fn find_permission(
    application_id: &str,
    policy_json: &str,
    statement_id: Option<&str>,
) -> Result<Option<PermissionRecord>> {
    let statements = parse(policy_json)?;
    Ok(find_by_statement_id(&statements, statement_id)?
        .map(|statement| PermissionRecord::from_statement(application_id, statement)))
}
