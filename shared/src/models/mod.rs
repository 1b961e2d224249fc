//! Data models
//!
//! Shared between backoffice-server and its API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY); timestamps are Unix millis.

pub mod menu;
pub mod permission;
pub mod role;
pub mod user;

// Re-exports
pub use menu::*;
pub use permission::*;
pub use role::*;
pub use user::*;
