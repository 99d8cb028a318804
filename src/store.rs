//! Storage seam: a `UserStore` hands out one `UserSession` per request.
//!
//! A session owns its backend resource (for Postgres, one pooled connection)
//! and gives it back when dropped, so release happens on every exit path of
//! the handler holding it, cancellation included.

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::{connect, ensure_schema, PgUserStore};

use crate::model::{NewUser, Page, User};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("email already registered: {0}")]
    DuplicateEmail(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify an insert failure: unique violations become `DuplicateEmail`.
    pub(crate) fn from_insert(err: sqlx::Error, email: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateEmail(email.to_string())
            }
            _ => StoreError::Db(err),
        }
    }
}

/// Unit of work scoped to one request.
#[async_trait]
pub trait UserSession: Send {
    /// Insert a user in its own transaction. Rolled back on any failure.
    async fn create_user(&mut self, new_user: &NewUser) -> Result<User, StoreError>;

    async fn find_user(&mut self, id: i32) -> Result<Option<User>, StoreError>;

    /// Users ordered by id ascending, windowed by `page`.
    async fn list_users(&mut self, page: Page) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Check out a session. Dropping it releases the underlying resource.
    async fn session(&self) -> Result<Box<dyn UserSession>, StoreError>;

    /// Liveness probe used by `/ready`.
    async fn ping(&self) -> Result<(), StoreError>;
}
