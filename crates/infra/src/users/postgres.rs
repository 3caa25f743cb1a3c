//! Postgres-backed account directory (`users` table).

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use bazaar_auth::{DirectoryError, Role, UserAccount, UserDirectory};
use bazaar_core::UserId;

#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: Arc<PgPool>,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), DirectoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id           UUID PRIMARY KEY,
                display_name TEXT NOT NULL,
                role         TEXT NOT NULL
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_users_table", e))?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_user(&self, id: UserId) -> Result<Option<UserAccount>, DirectoryError> {
        let row = sqlx::query("SELECT id, display_name, role FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let role: String = row
            .try_get("role")
            .map_err(|e| map_sqlx_error("decode_user", e))?;
        Ok(Some(UserAccount {
            id: UserId::from_uuid(row.try_get("id").map_err(|e| map_sqlx_error("decode_user", e))?),
            display_name: row
                .try_get("display_name")
                .map_err(|e| map_sqlx_error("decode_user", e))?,
            role: Role::new(role),
        }))
    }

    #[instrument(skip(self, account), fields(user_id = %account.id), err)]
    async fn register(&self, account: UserAccount) -> Result<(), DirectoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, display_name, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET display_name = EXCLUDED.display_name, role = EXCLUDED.role
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.display_name)
        .bind(account.role.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("register_user", e))?;
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DirectoryError {
    DirectoryError::Backend(format!("sqlx error in {}: {}", operation, err))
}
