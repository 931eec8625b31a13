//! Crate level errors.
//!
//! # Error Hierarchy
//!
//! The crate uses a two-layer error hierarchy:
//!
//! ## Admin Layer (`crate::error`)
//!
//! - [`AdminError`]: the logical outcome of an admin request. Partition-level
//!   failures are reduced into exactly one of these before they reach a caller.
//! - [`ErrorKind`]: the copyable classification used by reduction policies,
//!   metrics labels and status-code mapping.
//!
//! ## Metadata Layer (`crate::metadata`)
//!
//! - [`StoreError`]: failures of the versioned metadata store.
//!
//! ## Conversion
//!
//! [`StoreError`] converts into [`AdminError`] through a single mapping table
//! (see the `From` impl below), so every handler reports store failures the
//! same way.
//!
//! [`StoreError`]: crate::metadata::StoreError

use std::result;

use thiserror::Error as ThisError;

use crate::metadata::StoreError;

/// Result type for admin operations.
pub type AdminResult<T> = result::Result<T, AdminError>;

/// Classification of an [`AdminError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// The logical or physical resource is absent.
    NotFound,
    /// Duplicate creation, concurrent metadata modification or naming collision.
    Conflict,
    /// The resource is busy or the cursor target is invalid.
    PreconditionFailed,
    /// The operation is structurally disallowed on this kind of topic.
    MethodNotAllowed,
    /// Cross-cluster replication policy violation.
    Forbidden,
    /// The request arguments are invalid.
    NotAcceptable,
    /// Unexpected or transport failure.
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for the transport facade.
    ///
    /// | ErrorKind          | Status |
    /// |--------------------|--------|
    /// | NotFound           | 404    |
    /// | Conflict           | 409    |
    /// | PreconditionFailed | 412    |
    /// | MethodNotAllowed   | 405    |
    /// | Forbidden          | 403    |
    /// | NotAcceptable      | 406    |
    /// | Internal           | 500    |
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::PreconditionFailed => 412,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotAcceptable => 406,
            ErrorKind::Internal => 500,
        }
    }

    /// Returns a string label for metrics.
    pub fn as_metric_label(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::PreconditionFailed => "precondition_failed",
            ErrorKind::MethodNotAllowed => "method_not_allowed",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotAcceptable => "not_acceptable",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Logical error of an admin operation.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum AdminError {
    /// Resource absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate, concurrent modification or naming collision.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Busy resource or invalid cursor target.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Operation not allowed on this topic.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Replication policy violation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid request arguments.
    #[error("Not acceptable: {0}")]
    NotAcceptable(String),

    /// Unexpected failure of a collaborator.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdminError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AdminError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AdminError::Conflict(msg.into())
    }

    pub fn precondition_failed(msg: impl Into<String>) -> Self {
        AdminError::PreconditionFailed(msg.into())
    }

    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        AdminError::MethodNotAllowed(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AdminError::Forbidden(msg.into())
    }

    pub fn not_acceptable(msg: impl Into<String>) -> Self {
        AdminError::NotAcceptable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AdminError::Internal(msg.into())
    }

    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::NotFound(_) => ErrorKind::NotFound,
            AdminError::Conflict(_) => ErrorKind::Conflict,
            AdminError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            AdminError::MethodNotAllowed(_) => ErrorKind::MethodNotAllowed,
            AdminError::Forbidden(_) => ErrorKind::Forbidden,
            AdminError::NotAcceptable(_) => ErrorKind::NotAcceptable,
            AdminError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            AdminError::NotFound(m)
            | AdminError::Conflict(m)
            | AdminError::PreconditionFailed(m)
            | AdminError::MethodNotAllowed(m)
            | AdminError::Forbidden(m)
            | AdminError::NotAcceptable(m)
            | AdminError::Internal(m) => m,
        }
    }

    /// HTTP-style status code of this error.
    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    #[inline]
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    #[inline]
    pub fn is_precondition_failed(&self) -> bool {
        self.kind() == ErrorKind::PreconditionFailed
    }
}

// ============================================================================
// Store-to-Admin Error Mapping
// ============================================================================

/// Central mapping from metadata store failures to logical errors.
///
/// | StoreError     | AdminError                          |
/// |----------------|-------------------------------------|
/// | NotFound       | NotFound                            |
/// | AlreadyExists  | Conflict                            |
/// | BadVersion     | Conflict ("Concurrent modification") |
/// | Serde/Backend  | Internal                            |
impl From<StoreError> for AdminError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(path) => AdminError::NotFound(format!("{path} does not exist")),
            StoreError::AlreadyExists(path) => {
                AdminError::Conflict(format!("{path} already exists"))
            }
            StoreError::BadVersion { .. } => {
                AdminError::Conflict("Concurrent modification".to_string())
            }
            StoreError::Serde(msg) => AdminError::Internal(format!("Serialization error: {msg}")),
            StoreError::Backend(msg) => AdminError::Internal(msg),
        }
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(e: serde_json::Error) -> Self {
        AdminError::Internal(format!("Serialization error: {e}"))
    }
}

impl From<tokio::task::JoinError> for AdminError {
    fn from(e: tokio::task::JoinError) -> Self {
        if e.is_panic() {
            AdminError::Internal("Partition task panicked".to_string())
        } else {
            AdminError::Internal(format!("Partition task failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Version;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AdminError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(AdminError::conflict("x").kind(), ErrorKind::Conflict);
        assert_eq!(
            AdminError::precondition_failed("x").kind(),
            ErrorKind::PreconditionFailed
        );
        assert_eq!(
            AdminError::method_not_allowed("x").kind(),
            ErrorKind::MethodNotAllowed
        );
        assert_eq!(AdminError::forbidden("x").kind(), ErrorKind::Forbidden);
        assert_eq!(AdminError::not_acceptable("x").kind(), ErrorKind::NotAcceptable);
        assert_eq!(AdminError::internal("x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AdminError::not_found("x").status_code(), 404);
        assert_eq!(AdminError::conflict("x").status_code(), 409);
        assert_eq!(AdminError::precondition_failed("x").status_code(), 412);
        assert_eq!(AdminError::method_not_allowed("x").status_code(), 405);
        assert_eq!(AdminError::forbidden("x").status_code(), 403);
        assert_eq!(AdminError::not_acceptable("x").status_code(), 406);
        assert_eq!(AdminError::internal("x").status_code(), 500);
    }

    #[test]
    fn test_display_includes_message() {
        let err = AdminError::precondition_failed("Subscription has active connected consumers");
        assert_eq!(
            err.to_string(),
            "Precondition failed: Subscription has active connected consumers"
        );
        assert_eq!(err.message(), "Subscription has active connected consumers");
    }

    #[test]
    fn test_store_bad_version_is_conflict() {
        let err: AdminError = StoreError::BadVersion {
            path: "/a".to_string(),
            expected: Version::new(1),
            actual: Version::new(2),
        }
        .into();
        assert_eq!(err, AdminError::conflict("Concurrent modification"));
    }

    #[test]
    fn test_store_error_mapping() {
        let err: AdminError = StoreError::AlreadyExists("/a".to_string()).into();
        assert!(err.is_conflict());

        let err: AdminError = StoreError::NotFound("/a".to_string()).into();
        assert!(err.is_not_found());

        let err: AdminError = StoreError::Backend("zk session expired".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.message(), "zk session expired");
    }

    #[test]
    fn test_metric_labels_unique() {
        let kinds = [
            ErrorKind::NotFound,
            ErrorKind::Conflict,
            ErrorKind::PreconditionFailed,
            ErrorKind::MethodNotAllowed,
            ErrorKind::Forbidden,
            ErrorKind::NotAcceptable,
            ErrorKind::Internal,
        ];
        let labels: std::collections::HashSet<_> =
            kinds.iter().map(|k| k.as_metric_label()).collect();
        assert_eq!(labels.len(), kinds.len());
    }
}
