use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::types::TypeConstraintError;
use crate::models::config::ConfigLoadError;
use crate::repository::errors::RepositoryError;

/// Request-level failures of the image pipeline and the reconcile sweep.
///
/// Per-file problems (bad extension, oversized, undecodable) never reach this
/// type; they are logged and the file is skipped.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The metadata store is unreachable or rejected a statement.
    #[error("image store error: {0}")]
    Store(#[from] RepositoryError),
    /// A directory could not be created, listed or removed.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A value read back from the store violated a domain constraint.
    #[error(transparent)]
    TypeConstraint(#[from] TypeConstraintError),
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
}

impl ServiceError {
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Convenient alias for results returned from service functions.
pub type ServiceResult<T> = Result<T, ServiceError>;
