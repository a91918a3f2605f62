use osm_changeset::ChangesetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Changeset(#[from] ChangesetError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid credentials file: {0}")]
    Credentials(#[from] serde_yaml_ng::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ImportError {
    /// Whether the error means the database is unreachable, so a batch
    /// cannot continue with the next file.
    pub fn is_connection_level(&self) -> bool {
        match self {
            Self::Database(e) => matches!(
                e,
                sqlx::Error::Configuration(_)
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            Self::Migration(_) | Self::Config(_) | Self::Credentials(_) => true,
            Self::Changeset(_) | Self::Io(_) | Self::Json(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_connection_level() {
        assert!(ImportError::Database(sqlx::Error::PoolTimedOut).is_connection_level());
        assert!(ImportError::Database(sqlx::Error::PoolClosed).is_connection_level());
    }

    #[test]
    fn test_row_errors_are_not_connection_level() {
        assert!(!ImportError::Database(sqlx::Error::RowNotFound).is_connection_level());
        let parse = ChangesetError::InvalidChangesetId("x".into());
        assert!(!ImportError::Changeset(parse).is_connection_level());
    }

    #[test]
    fn test_config_error_display() {
        let err = ImportError::Config("DATABASE_URL not set".into());
        assert_eq!(err.to_string(), "configuration error: DATABASE_URL not set");
    }
}
