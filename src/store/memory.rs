//! In-process backend with the same semantics as the Postgres one: server-assigned
//! ids, unique emails, id-ordered listing. Counts open sessions so callers can
//! check that every request released its session.

use super::{StoreError, UserSession, UserStore};
use crate::model::{NewUser, Page, User};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Table {
    next_id: i32,
    rows: Vec<User>,
}

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    table: Arc<Mutex<Table>>,
    open_sessions: Arc<AtomicUsize>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions checked out and not yet dropped.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn count_email(&self, email: &str) -> usize {
        self.table
            .lock()
            .await
            .rows
            .iter()
            .filter(|u| u.email == email)
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn session(&self) -> Result<Box<dyn UserSession>, StoreError> {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            table: Arc::clone(&self.table),
            open_sessions: Arc::clone(&self.open_sessions),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

struct MemorySession {
    table: Arc<Mutex<Table>>,
    open_sessions: Arc<AtomicUsize>,
}

#[async_trait]
impl UserSession for MemorySession {
    async fn create_user(&mut self, new_user: &NewUser) -> Result<User, StoreError> {
        let mut table = self.table.lock().await;
        if table.rows.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail(new_user.email.clone()));
        }
        table.next_id += 1;
        let user = User {
            id: table.next_id,
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            age: new_user.age,
            created_at: Utc::now(),
            updated_at: None,
        };
        table.rows.push(user.clone());
        Ok(user)
    }

    async fn find_user(&mut self, id: i32) -> Result<Option<User>, StoreError> {
        let table = self.table.lock().await;
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&mut self, page: Page) -> Result<Vec<User>, StoreError> {
        let table = self.table.lock().await;
        let skip = usize::try_from(page.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(0);
        // Rows are appended with increasing ids, so insertion order is id order.
        Ok(table.rows.iter().skip(skip).take(limit).cloned().collect())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}
