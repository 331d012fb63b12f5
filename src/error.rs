use crate::line::GroupId;
use crate::persistence::PersistenceError;
use crate::proration::ProrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("line {line_id} is {found}, expected {expected}")]
    StateConflict {
        line_id: i64,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("group {group_id} is inconsistent: {message}")]
    Consistency { group_id: GroupId, message: String },

    #[error(transparent)]
    Storage(#[from] PersistenceError),
}

impl PlanningError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn consistency(group_id: GroupId, message: impl Into<String>) -> Self {
        Self::Consistency {
            group_id,
            message: message.into(),
        }
    }

    pub(crate) fn line_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "project line",
            id,
        }
    }

    /// Stable machine-readable label, used by the HTTP layer.
    pub fn kind(&self) -> &'static str {
        match self {
            PlanningError::Validation(_) => "validation_error",
            PlanningError::StateConflict { .. } => "state_conflict",
            PlanningError::NotFound { .. } => "not_found",
            PlanningError::Consistency { .. } => "consistency_error",
            PlanningError::Storage(_) => "storage_error",
        }
    }
}

impl From<ProrationError> for PlanningError {
    fn from(value: ProrationError) -> Self {
        Self::Validation(value.to_string())
    }
}

pub type PlanningResult<T> = Result<T, PlanningError>;

/// Failure of [`crate::LinePlanner::allocate`].
pub type AllocationError = PlanningError;
/// Failure of [`crate::LinePlanner::report_remainder`].
pub type RepairError = PlanningError;
/// Failure of [`crate::LinePlanner::delete_line`].
pub type DeletionError = PlanningError;
