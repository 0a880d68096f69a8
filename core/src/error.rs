use thiserror::Error;
use tracing::error;

/// Failures surfaced by the service layer to user-facing callers.
///
/// Silent no-ops (switching to an unknown workspace, removing an absent
/// member, deleting an absent workspace) are deliberately not represented
/// here: those operations return `Ok` and swallow the absence.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{field} must not be empty")]
    MissingInput { field: &'static str },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("not permitted to {action}")]
    Forbidden { action: &'static str },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ServiceError {
    pub(crate) fn missing_input(field: &'static str) -> Self {
        Self::MissingInput { field }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn forbidden(action: &'static str) -> Self {
        error!(action, "operation rejected by role check");
        Self::Forbidden { action }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
