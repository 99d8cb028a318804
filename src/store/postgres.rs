//! PostgreSQL backend: pool construction, `users` DDL, and the per-request session.

use super::{StoreError, UserSession, UserStore};
use crate::config::DbConfig;
use crate::model::{NewUser, Page, User};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Connection, Postgres};

const USER_COLUMNS: &str = "id, name, email, age, created_at, updated_at";

/// Build the pool. Connections are opened on demand, pinged before each
/// checkout, and recycled after `max_lifetime`.
pub fn connect(config: &DbConfig) -> PgPool {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .test_before_acquire(true)
        .connect_lazy_with(config.connect_options())
}

/// Key of the transaction-scoped advisory lock that serializes schema setup.
const SCHEMA_LOCK_KEY: i64 = 0x7573_6572_735f_6464;

/// Create the `users` table and its timestamp trigger if absent.
/// Instances starting together take turns on an advisory lock held until commit,
/// so the function and trigger DDL never run concurrently.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            name VARCHAR(50) NOT NULL,
            email VARCHAR(100) NOT NULL,
            age INTEGER,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ,
            CONSTRAINT users_email_key UNIQUE (email)
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // created_at is pinned to its inserted value; updated_at follows every modification.
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION users_touch_timestamps()
        RETURNS TRIGGER AS $$
        BEGIN
            NEW.created_at = OLD.created_at;
            NEW.updated_at = NOW();
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("DROP TRIGGER IF EXISTS users_touch_timestamps ON users")
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER users_touch_timestamps
            BEFORE UPDATE ON users
            FOR EACH ROW
            EXECUTE FUNCTION users_touch_timestamps()
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!("users schema ready");
    Ok(())
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        PgUserStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn session(&self) -> Result<Box<dyn UserSession>, StoreError> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PgSession { conn }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One checked-out connection. Dropping it returns the connection to the pool;
/// an uncommitted transaction on it is rolled back by sqlx at that point.
struct PgSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl UserSession for PgSession {
    async fn create_user(&mut self, new_user: &NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (name, email, age) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let mut tx = self.conn.begin().await?;
        let inserted = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(new_user.age)
            .fetch_one(&mut *tx)
            .await;

        match inserted {
            Ok(user) => {
                tx.commit().await?;
                Ok(user)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback after failed insert");
                }
                Err(StoreError::from_insert(err, &new_user.email))
            }
        }
    }

    async fn find_user(&mut self, id: i32) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        tracing::debug!(sql = %sql, id, "query");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(user)
    }

    async fn list_users(&mut self, page: Page) -> Result<Vec<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY id ASC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );
        tracing::debug!(sql = %sql, skip = page.skip, limit = page.limit, "query");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(users)
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        tracing::trace!("session released");
    }
}
