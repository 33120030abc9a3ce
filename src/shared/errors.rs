use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("PC {0} is not available")]
    ResourceUnavailable(i32),

    #[error("Invalid transition: cannot {action} {entity} {id} in state {from}")]
    InvalidTransition {
        entity: &'static str,
        id: i32,
        from: String,
        action: &'static str,
    },

    #[error("Menu item {0} is unavailable")]
    ItemUnavailable(i32),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        DomainError::NotFound {
            entity,
            field: "id",
            value: id.to_string(),
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        id: i32,
        from: impl ToString,
        action: &'static str,
    ) -> Self {
        DomainError::InvalidTransition {
            entity,
            id,
            from: from.to_string(),
            action,
        }
    }

    /// Whether this error is likely transient and the operation may
    /// succeed if retried (lost optimistic update, locked database).
    pub fn is_transient(&self) -> bool {
        match self {
            DomainError::Conflict(msg) => msg.starts_with("Concurrent update"),
            DomainError::Storage(msg) => msg.contains("database is locked"),
            _ => false,
        }
    }

    /// Whether the error belongs to the validation class
    /// (bad input rather than bad state).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::Validation(_) | DomainError::ItemUnavailable(_)
        )
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Storage(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
