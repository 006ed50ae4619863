//! Postgres binding of the credential store gateway.

use crate::credential::models::Credential;
use crate::credential::repo::{CredentialStore, NewCredential, StoreError};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users table if it does not exist yet.
    ///
    /// The engine owns no other schema; sessions and outbound email live with
    /// their own collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL statement fails.
    pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
        let query = r"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role_name TEXT NOT NULL DEFAULT 'user',
                name TEXT,
                email_verified BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "CREATE TABLE",
            db.statement = query
        );
        sqlx::query(query).execute(pool).instrument(span).await?;
        Ok(())
    }
}

const CREDENTIAL_COLUMNS: &str = "id, email, password_hash, role_name, name, email_verified";

fn credential_from_row(row: &sqlx::postgres::PgRow) -> Credential {
    Credential {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: row.get("role_name"),
        name: row.get("name"),
        email_verified: row.get("email_verified"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn map_store_error(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn get_by_email(&self, email: &str) -> Result<Credential, StoreError> {
        let query = format!("SELECT {CREDENTIAL_COLUMNS} FROM users WHERE email = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(map_store_error)?;

        row.as_ref()
            .map(credential_from_row)
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Credential, StoreError> {
        let query = format!("SELECT {CREDENTIAL_COLUMNS} FROM users WHERE id = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(map_store_error)?;

        row.as_ref()
            .map(credential_from_row)
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, new: NewCredential<'_>) -> Result<Credential, StoreError> {
        let query = format!(
            r"
            INSERT INTO users (email, password_hash, role_name, name)
            VALUES ($1, $2, $3, $4)
            RETURNING {CREDENTIAL_COLUMNS}
            "
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(new.email)
            .bind(new.password_hash)
            .bind(new.role)
            .bind(new.name)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(credential_from_row(&row)),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(map_store_error(err)),
        }
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), StoreError> {
        let query = "UPDATE users SET email_verified = TRUE WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(map_store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn map_store_error_reports_unavailable() {
        let mapped = map_store_error(sqlx::Error::PoolClosed);
        assert!(matches!(mapped, StoreError::Unavailable(_)));
    }
}
