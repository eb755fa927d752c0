use crate::model::Validate;
use crate::store::UniqueViolation;

/// Whole-call outcome of a core operation that did not produce a result.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid input: {0}")]
    Validation(String),
    /// A delete batch item carried no identifying key; nothing was deleted.
    #[error("item {index} carries no identifying key")]
    MissingIdentity { index: usize },
    #[error("{0}")]
    Unresolved(String),
    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Rejects the whole batch on the first malformed item.
pub fn validate_all<T: Validate>(items: &[T]) -> ServiceResult<()> {
    for (index, item) in items.iter().enumerate() {
        item.validate()
            .map_err(|reason| ServiceError::Validation(format!("item {}: {}", index, reason)))?;
    }
    Ok(())
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<UniqueViolation>() {
            Some(violation) => ServiceError::Conflict(violation.to_string()),
            None => ServiceError::Storage(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn unique_violation_becomes_conflict() {
        let err = anyhow::Error::new(UniqueViolation {
            constraint: "roles_name_key".to_string(),
        });
        assert!(matches!(ServiceError::from(err), ServiceError::Conflict(msg) if msg.contains("roles_name_key")));
    }

    #[test]
    fn other_errors_are_storage_failures() {
        let err = anyhow!("connection reset");
        assert!(matches!(ServiceError::from(err), ServiceError::Storage(_)));
    }
}
