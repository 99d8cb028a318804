//! User entity and the request schemas around it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page size used when the client does not send `limit`.
pub const DEFAULT_LIMIT: i64 = 10;
/// Larger `limit` values are clamped to this.
pub const MAX_LIMIT: i64 = 1000;

/// A row of the `users` table, as returned by every user endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
    /// Null until the row is modified after creation.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields a client supplies to create a user. Unknown keys, `id` included, are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<i32>,
}

/// Raw `?skip=&limit=` query of the list endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Checked offset/limit window. Build it with [`ListParams::into_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}
