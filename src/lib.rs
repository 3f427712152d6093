//! Kittygram: REST backend for cats, their owners and achievements.

pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod representation;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;

pub use config::{ServerConfig, StorageKind};
pub use error::{AppError, ConfigError, FieldErrors};
pub use migration::{apply_migrations, ensure_database_exists};
pub use routes::{api_routes, app, common_routes};
pub use state::AppState;
pub use store::{CatRepository, InMemoryStore, PgStore, Storage};
