use sqlx::PgPool;

use crate::app_error::AppError;

pub mod billing_customer;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // PostgreSQL unique violation - callers treat this as
                // "someone else got there first" and re-read
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    AppError::Conflict
                } else {
                    AppError::Database(msg.to_string())
                }
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}
