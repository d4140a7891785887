//! AWS SDK integration: Q Business client wrapper and SDK error classification.

/// Q Business client
pub mod qbusiness_client;

use aws_sdk_qbusiness::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::fmt::Debug;

use crate::errors::{ErrorClassification, RemoteCallError};

/// Map a Q Business error code to its classification.
///
/// Codes without a dedicated classification, including a missing code
/// (transport or timeout failures), are `Generic`.
#[must_use]
pub fn classify_error_code(code: Option<&str>) -> ErrorClassification {
    match code {
        Some("AccessDeniedException") => ErrorClassification::AccessDenied,
        Some("ThrottlingException") => ErrorClassification::Throttling,
        Some("ConflictException") => ErrorClassification::Conflict,
        Some("ResourceNotFoundException") => ErrorClassification::NotFound,
        Some("ValidationException") => ErrorClassification::Validation,
        Some("ServiceQuotaExceededException") => ErrorClassification::QuotaExceeded,
        _ => ErrorClassification::Generic,
    }
}

/// Classify a failed SDK call into a [`RemoteCallError`]
pub fn classify_sdk_error<E, R>(error: &SdkError<E, R>) -> RemoteCallError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let classification = classify_error_code(error.code());
    RemoteCallError::new(classification, DisplayErrorContext(error).to_string())
}
