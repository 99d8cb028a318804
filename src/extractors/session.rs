//! Session-per-request: gives the handler a handle that checks a `UserSession`
//! out of the store on first use.

use crate::error::AppError;
use crate::state::AppState;
use crate::store::{StoreError, UserSession, UserStore};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Owned by the handler for the whole request. Nothing is checked out until
/// [`DbSession::get`] is called, so handlers decode and validate first. When the
/// handler future ends, on success, error or cancellation, the session drops
/// and is released.
pub struct DbSession {
    store: Arc<dyn UserStore>,
    session: Option<Box<dyn UserSession>>,
}

impl DbSession {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        DbSession {
            store,
            session: None,
        }
    }

    /// The request's session, acquiring it on the first call.
    pub async fn get(&mut self) -> Result<&mut Box<dyn UserSession>, StoreError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.store.session().await?,
        };
        Ok(self.session.insert(session))
    }

    pub fn is_acquired(&self) -> bool {
        self.session.is_some()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for DbSession {
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(DbSession::new(Arc::clone(&state.store)))
    }
}
