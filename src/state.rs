//! Shared application state for all routes.

use crate::store::UserStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Source of per-request sessions. Postgres in production, in-memory in tests.
    pub store: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        AppState { store }
    }
}
