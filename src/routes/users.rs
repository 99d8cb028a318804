//! User routes. The collection answers with and without the trailing slash.

use crate::handlers::{create_user, list_users, read_user};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", get(list_users).post(create_user))
        .route("/users/:id", get(read_user))
}
