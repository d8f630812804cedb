//! Credential record stores

use crate::config::AuthConfig;
use crate::traits::UserStore;
use crate::user::{CredentialRecord, Role};
use crate::AuthResult;
use async_trait::async_trait;
use std::sync::Arc;

/// The canonical mock credential table.
///
/// Secrets are plaintext on purpose: the mock backend compares them with
/// string equality. Real deployments load Argon2 hashes instead.
pub fn seed_users() -> Vec<CredentialRecord> {
    vec![
        CredentialRecord {
            id: "1".to_string(),
            email: "admin@example.com".to_string(),
            name: "Admin User".to_string(),
            role: Role::Admin,
            secret: "admin123".to_string(),
        },
        CredentialRecord {
            id: "2".to_string(),
            email: "hod@example.com".to_string(),
            name: "HOD User".to_string(),
            role: Role::Hod,
            secret: "hod123".to_string(),
        },
        CredentialRecord {
            id: "3".to_string(),
            email: "faculty@example.com".to_string(),
            name: "Faculty User".to_string(),
            role: Role::Faculty,
            secret: "faculty123".to_string(),
        },
    ]
}

/// In-memory user store
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    records: Vec<CredentialRecord>,
}

impl MemoryUserStore {
    pub fn new(records: Vec<CredentialRecord>) -> Self {
        Self { records }
    }

    /// Store holding the seeded admin, hod and faculty accounts
    pub fn seeded() -> Self {
        Self::new(seed_users())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<CredentialRecord>> {
        let email = email.trim();
        Ok(self
            .records
            .iter()
            .find(|record| record.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

/// User store named by the configuration: the database when `DATABASE_URL`
/// is set and the `postgres` feature is on, the seeded table otherwise.
pub async fn user_store_from_config(config: &AuthConfig) -> AuthResult<Arc<dyn UserStore>> {
    match config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        Some(url) => Ok(Arc::new(PgUserStore::connect(url).await?)),
        #[cfg(not(feature = "postgres"))]
        Some(_) => {
            tracing::warn!("DATABASE_URL is set but the postgres feature is disabled, using seeded users");
            Ok(Arc::new(MemoryUserStore::seeded()))
        }
        None => Ok(Arc::new(MemoryUserStore::seeded())),
    }
}

#[cfg(feature = "postgres")]
pub use self::postgres::PgUserStore;

#[cfg(feature = "postgres")]
mod postgres {
    use super::*;
    use crate::AuthError;
    use sqlx::postgres::{PgPool, PgPoolOptions};
    use sqlx::Row;

    /// Postgres-backed user store reading a `users` table with
    /// `id, email, name, role, password` columns.
    #[derive(Debug, Clone)]
    pub struct PgUserStore {
        pool: PgPool,
    }

    impl PgUserStore {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        pub async fn connect(database_url: &str) -> AuthResult<Self> {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            tracing::info!("Connected user store to database");
            Ok(Self::new(pool))
        }
    }

    #[async_trait]
    impl UserStore for PgUserStore {
        async fn find_by_email(&self, email: &str) -> AuthResult<Option<CredentialRecord>> {
            let row = sqlx::query(
                "SELECT id::text AS id, email, name, role, password FROM users WHERE lower(email) = lower($1) LIMIT 1",
            )
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

            let Some(row) = row else {
                return Ok(None);
            };

            let role: String = row.try_get("role")?;
            let role: Role = role.parse().map_err(|err: AuthError| {
                tracing::error!(%err, "users table holds a role outside admin/hod/faculty");
                err
            })?;

            Ok(Some(CredentialRecord {
                id: row.try_get("id")?,
                email: row.try_get("email")?,
                name: row.try_get("name")?,
                role,
                secret: row.try_get("password")?,
            }))
        }
    }
}
