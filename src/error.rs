use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Maps constraint violations reported by the driver to `Conflict` /
    /// `ValidationError`; everything else stays a database error.
    pub fn from_write(err: DbErr, what: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                AppError::Conflict(format!("{what} already exists ({detail})"))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                AppError::ValidationError(format!("{what} references a missing row ({detail})"))
            }
            _ => AppError::DatabaseError(err),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "UNIQUE_CONSTRAINT",
            AppError::ConfigError(_) => "CONFIG_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::ValidationError(_) | AppError::NotFound(_) | AppError::Conflict(_)
        )
    }

    pub fn log(&self) {
        if self.is_client_error() {
            log::warn!("{}: {self}", self.code());
        } else {
            log::error!("{}: {self}", self.code());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(AppError::Conflict("x".into()).code(), "UNIQUE_CONSTRAINT");
        assert_eq!(
            AppError::DatabaseError(DbErr::Custom("boom".into())).code(),
            "DATABASE_ERROR"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(AppError::ValidationError("bad".into()).is_client_error());
        assert!(!AppError::InternalError("oops".into()).is_client_error());
    }

    #[test]
    fn test_from_write_keeps_plain_db_errors() {
        let err = AppError::from_write(DbErr::Custom("boom".into()), "User");
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
