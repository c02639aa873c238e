//! Database-specific error types and conversions.

use techaid_core::error::TechAidError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Stored value could not be decoded: {0}")]
    Decode(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

impl DbError {
    /// Classify an error returned by `Response::check`. Unique-index
    /// violations become `AlreadyExists`.
    /// Optimistic transaction conflicts that SurrealDB reports as safe to
    /// run again.
    pub(crate) fn is_conflict(&self) -> bool {
        let message = self.to_string();
        message.contains("can be retried") || message.contains("conflict")
    }

    pub(crate) fn from_check(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for TechAidError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TechAidError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => TechAidError::AlreadyExists { entity },
            DbError::Hash(msg) => TechAidError::Crypto(msg),
            other => TechAidError::Database(other.to_string()),
        }
    }
}
