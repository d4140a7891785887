use async_trait::async_trait;
use log::{debug, info};

use super::{HandlerErrorCode, PermissionModel, ProgressEvent, ResourceHandlerRequest};
use crate::errors::{ProviderError, RemoteCallError, RemoteOperation, Result};
use crate::policy::{find_permission, parse_permissions, PermissionRecord};

/// Q Business calls backing the Permission resource
#[async_trait]
pub trait PermissionOperations: Send + Sync {
    /// Current resource policy of the application, if it has one
    async fn get_policy(
        &self,
        application_id: &str,
    ) -> std::result::Result<Option<String>, RemoteCallError>;

    /// Add a statement to the application policy
    async fn associate_permission(
        &self,
        application_id: &str,
        statement_id: &str,
        actions: &[String],
        principal: &str,
    ) -> std::result::Result<(), RemoteCallError>;

    /// Remove a statement from the application policy
    async fn disassociate_permission(
        &self,
        application_id: &str,
        statement_id: &str,
    ) -> std::result::Result<(), RemoteCallError>;
}

/// Create/Read/Delete/List handlers for `AWS::QBusiness::Permission`.
///
/// Permissions have no update: every property is create-only.
pub struct PermissionHandler<'a, T: ?Sized> {
    operations: &'a T,
}

/// Required fields of a Create request
struct NewPermission<'m> {
    application_id: &'m str,
    statement_id: &'m str,
    principal: &'m str,
    actions: &'m [String],
}

impl<'m> NewPermission<'m> {
    fn from_model(model: &'m PermissionModel) -> std::result::Result<Self, &'static str> {
        Ok(Self {
            application_id: model.application_id.as_deref().ok_or("ApplicationId")?,
            statement_id: model.statement_id.as_deref().ok_or("StatementId")?,
            principal: model.principal.as_deref().ok_or("Principal")?,
            actions: model
                .actions
                .as_deref()
                .filter(|actions| !actions.is_empty())
                .ok_or("Actions")?,
        })
    }
}

fn invalid_request<M>(message: impl Into<String>) -> ProgressEvent<M> {
    ProgressEvent::failed(HandlerErrorCode::InvalidRequest, message)
}

fn not_found<M>(application_id: &str, statement_id: &str) -> ProgressEvent<M> {
    ProgressEvent::failed(
        HandlerErrorCode::NotFound,
        format!(
            "{} with StatementId '{}' not found in application '{}'",
            PermissionModel::TYPE_NAME,
            statement_id,
            application_id
        ),
    )
}

impl<'a, T> PermissionHandler<'a, T>
where
    T: PermissionOperations + ?Sized,
{
    /// New handler over the given operations
    pub const fn new(operations: &'a T) -> Self {
        Self { operations }
    }

    async fn fetch_policy(&self, application_id: &str) -> Result<Option<String>> {
        self.operations
            .get_policy(application_id)
            .await
            .map_err(|e| ProviderError::remote_call(RemoteOperation::GetPolicy, application_id, e))
    }

    /// The statement with `statement_id`, or `None` if the application has no
    /// policy or no such statement
    async fn find(
        &self,
        application_id: &str,
        statement_id: Option<&str>,
    ) -> Result<Option<PermissionRecord>> {
        match self.fetch_policy(application_id).await? {
            Some(policy) => find_permission(application_id, &policy, statement_id),
            None => {
                // Lookup still requires an id even when there is nothing to search
                statement_id.ok_or_else(|| ProviderError::invalid_argument("statementId"))?;
                Ok(None)
            }
        }
    }

    /// Create handler
    pub async fn create(
        &self,
        request: &ResourceHandlerRequest<PermissionModel>,
    ) -> ProgressEvent<PermissionModel> {
        let Some(model) = request.desired_resource_state.as_ref() else {
            return invalid_request("desiredResourceState is required");
        };
        let permission = match NewPermission::from_model(model) {
            Ok(permission) => permission,
            Err(field) => return invalid_request(format!("{field} is required")),
        };

        match self
            .find(permission.application_id, Some(permission.statement_id))
            .await
        {
            Ok(Some(_)) => {
                return ProgressEvent::failed(
                    HandlerErrorCode::AlreadyExists,
                    format!(
                        "{} with StatementId '{}' already exists",
                        PermissionModel::TYPE_NAME,
                        permission.statement_id
                    ),
                )
            }
            Ok(None) => {}
            Err(e) => return ProgressEvent::from_error(&e),
        }

        info!(
            "Associating permission {} on application {}",
            permission.statement_id, permission.application_id
        );
        if let Err(e) = self
            .operations
            .associate_permission(
                permission.application_id,
                permission.statement_id,
                permission.actions,
                permission.principal,
            )
            .await
        {
            return ProgressEvent::from_error(&ProviderError::remote_call(
                RemoteOperation::AssociatePermission,
                permission.application_id,
                e,
            ));
        }

        match self
            .find(permission.application_id, Some(permission.statement_id))
            .await
        {
            Ok(Some(record)) => ProgressEvent::success(record.into()),
            Ok(None) => ProgressEvent::success(model.clone()),
            Err(e) => ProgressEvent::from_error(&e),
        }
    }

    /// Read handler
    pub async fn read(
        &self,
        request: &ResourceHandlerRequest<PermissionModel>,
    ) -> ProgressEvent<PermissionModel> {
        let Some(model) = request.desired_resource_state.as_ref() else {
            return invalid_request("desiredResourceState is required");
        };
        let Some(application_id) = model.application_id.as_deref() else {
            return invalid_request("ApplicationId is required");
        };

        match self.find(application_id, model.statement_id.as_deref()).await {
            Ok(Some(record)) => ProgressEvent::success(record.into()),
            Ok(None) => not_found(
                application_id,
                model.statement_id.as_deref().unwrap_or_default(),
            ),
            Err(e) => ProgressEvent::from_error(&e),
        }
    }

    /// Delete handler
    pub async fn delete(
        &self,
        request: &ResourceHandlerRequest<PermissionModel>,
    ) -> ProgressEvent<PermissionModel> {
        let Some(model) = request.desired_resource_state.as_ref() else {
            return invalid_request("desiredResourceState is required");
        };
        let (Some(application_id), Some(statement_id)) = (
            model.application_id.as_deref(),
            model.statement_id.as_deref(),
        ) else {
            return invalid_request("ApplicationId and StatementId are required");
        };

        match self.find(application_id, Some(statement_id)).await {
            Ok(Some(_)) => {}
            Ok(None) => return not_found(application_id, statement_id),
            Err(e) => return ProgressEvent::from_error(&e),
        }

        info!(
            "Disassociating permission {} from application {}",
            statement_id, application_id
        );
        match self
            .operations
            .disassociate_permission(application_id, statement_id)
            .await
        {
            Ok(()) => ProgressEvent::success_empty(),
            Err(e) => ProgressEvent::from_error(&ProviderError::remote_call(
                RemoteOperation::DisassociatePermission,
                application_id,
                e,
            )),
        }
    }

    /// List handler: every statement of the application policy
    pub async fn list(
        &self,
        request: &ResourceHandlerRequest<PermissionModel>,
    ) -> ProgressEvent<PermissionModel> {
        let Some(application_id) = request
            .desired_resource_state
            .as_ref()
            .and_then(|model| model.application_id.as_deref())
        else {
            return invalid_request("ApplicationId is required");
        };

        let policy = match self.fetch_policy(application_id).await {
            Ok(Some(policy)) => policy,
            Ok(None) => {
                debug!("Application {} has no policy", application_id);
                return ProgressEvent::success_list(Vec::new());
            }
            Err(e) => return ProgressEvent::from_error(&e),
        };

        match parse_permissions(application_id, Some(&policy)) {
            Ok(records) => {
                ProgressEvent::success_list(records.into_iter().map(PermissionModel::from).collect())
            }
            Err(e) => ProgressEvent::from_error(&e),
        }
    }
}
