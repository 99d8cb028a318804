//! users-api: user CRUD over PostgreSQL with a session per request.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
pub mod telemetry;

pub use config::{AppConfig, DbConfig, ServerConfig};
pub use error::{AppError, ConfigError};
pub use model::{ListParams, NewUser, Page, User};
pub use routes::app;
pub use state::AppState;
pub use store::{connect, ensure_schema, MemoryUserStore, PgUserStore, StoreError, UserSession, UserStore};
