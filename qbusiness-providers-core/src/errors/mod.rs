//! Error handling module

use std::fmt;
use thiserror::Error;

/// Result type alias for operations that can fail with `ProviderError`
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Classification of a failed remote call.
///
/// Produced by the error-mapping side of a remote operation (see
/// [`crate::aws::classify_sdk_error`]) and carried through the core untouched.
/// Callers decide from it whether a handler invocation is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClassification {
    /// The caller is not allowed to perform the operation
    AccessDenied,
    /// The request was throttled
    Throttling,
    /// The resource is in a conflicting state
    Conflict,
    /// The target resource does not exist
    NotFound,
    /// The request failed service-side validation
    Validation,
    /// A service quota would be exceeded
    QuotaExceeded,
    /// Any other service or transport failure
    Generic,
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AccessDenied => "access-denied",
            Self::Throttling => "throttling",
            Self::Conflict => "conflict",
            Self::NotFound => "not-found",
            Self::Validation => "validation",
            Self::QuotaExceeded => "quota-exceeded",
            Self::Generic => "generic-service-error",
        };
        f.write_str(name)
    }
}

/// Failure of a remote operation, already classified by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{classification}: {message}")]
pub struct RemoteCallError {
    /// Classification assigned by the remote-call collaborator
    pub classification: ErrorClassification,
    /// Human readable message from the service or transport
    pub message: String,
}

impl RemoteCallError {
    /// Create a classified remote call error
    pub fn new(classification: ErrorClassification, message: impl Into<String>) -> Self {
        Self {
            classification,
            message: message.into(),
        }
    }
}

/// Remote Q Business operations whose failures the core reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOperation {
    /// Removal of tag keys
    Untag,
    /// Addition or overwrite of tag values
    Tag,
    /// Read of the current tags
    ListTags,
    /// Read of an application's resource policy
    GetPolicy,
    /// Addition of a policy statement
    AssociatePermission,
    /// Removal of a policy statement
    DisassociatePermission,
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Untag => "UntagResource",
            Self::Tag => "TagResource",
            Self::ListTags => "ListTagsForResource",
            Self::GetPolicy => "GetPolicy",
            Self::AssociatePermission => "AssociatePermission",
            Self::DisassociatePermission => "DisassociatePermission",
        };
        f.write_str(name)
    }
}

/// Error type for tag reconciliation, policy parsing and handler plumbing.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Policy JSON unparsable or missing required structure
    #[error("Malformed policy document: {message}")]
    MalformedPolicy {
        /// What was wrong with the document
        message: String,
        /// The underlying JSON error, if any
        #[source]
        source: Option<serde_json::Error>,
    },

    /// A statement resolved to zero or several distinct principals
    #[error("Statement '{statement_id}' must have exactly one principal, found {count}")]
    InvalidStatementPrincipalCount {
        /// Sid of the offending statement
        statement_id: String,
        /// Number of distinct principals resolved
        count: usize,
    },

    /// A required argument was not supplied
    #[error("Invalid argument: {argument} is required")]
    InvalidArgument {
        /// Name of the missing argument
        argument: String,
    },

    /// A remote call failed; the classification is passed through as-is
    #[error("{operation} failed for '{resource}': {source}")]
    RemoteCallFailure {
        /// Which remote operation failed
        operation: RemoteOperation,
        /// Resource ARN or application id the call was scoped to
        resource: String,
        /// The classified failure
        #[source]
        source: RemoteCallError,
    },

    /// Embedded configuration missing or invalid
    #[error("Configuration error: {message}")]
    Configuration {
        /// Detailed error message about the configuration issue
        message: String,
        /// Optional underlying error that caused the configuration failure
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ProviderError {
    /// Create a malformed policy error without an underlying JSON error
    pub(crate) fn malformed_policy(message: impl Into<String>) -> Self {
        Self::MalformedPolicy {
            message: message.into(),
            source: None,
        }
    }

    /// Create a malformed policy error from a JSON decoding failure
    pub(crate) fn malformed_policy_with_source(
        message: impl Into<String>,
        source: serde_json::Error,
    ) -> Self {
        Self::MalformedPolicy {
            message: message.into(),
            source: Some(source),
        }
    }

    pub(crate) fn invalid_principal_count(statement_id: impl Into<String>, count: usize) -> Self {
        Self::InvalidStatementPrincipalCount {
            statement_id: statement_id.into(),
            count,
        }
    }

    /// Create an invalid argument error
    pub(crate) fn invalid_argument(argument: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
        }
    }

    pub(crate) fn remote_call(
        operation: RemoteOperation,
        resource: impl Into<String>,
        source: RemoteCallError,
    ) -> Self {
        Self::RemoteCallFailure {
            operation,
            resource: resource.into(),
            source,
        }
    }

    /// Create a configuration error with source
    pub(crate) fn configuration_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Classification of the underlying remote failure, if this is one
    #[must_use]
    pub const fn classification(&self) -> Option<ErrorClassification> {
        match self {
            Self::RemoteCallFailure { source, .. } => Some(source.classification),
            _ => None,
        }
    }
}
