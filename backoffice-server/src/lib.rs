//! Backoffice Server - HR/ERP back-office API
//!
//! # Overview
//!
//! The core of this crate is the role/permission-scoped navigation menu:
//! users hold roles, roles hold permissions, and each menu node is unlocked
//! either by any of its declared permissions or, when it declares none, by an
//! explicit role grant. The authorized nodes are assembled into an ordered tree.
//!
//! - **Database** (`db`): SQLite pool, migrations and explicit repository functions
//! - **Auth** (`auth`): JWT bearer tokens, Argon2 passwords, admin gate
//! - **Services** (`services`): access resolver, hierarchy builder, menu admin
//! - **HTTP API** (`api`): axum routers and handlers
//!
//! # Layout
//!
//! ```text
//! backoffice-server/src/
//! ├── core/          # config, state, server
//! ├── auth/          # JWT, passwords, middleware
//! ├── db/            # pool + repositories
//! ├── services/      # menu access, hierarchy, admin mutations
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # logging, validation, extractors
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env` and initialize logging from the environment
pub fn setup_environment() {
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    let json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    init_logger_with_file(log_level.as_deref(), json, log_dir.as_deref());
}

pub fn print_banner() {
    println!(
        r#"
    ____             __         __________
   / __ )____ ______/ /______  / __/ __(_)_______
  / __  / __ `/ ___/ //_/ __ \/ /_/ /_/ / ___/ _ \
 / /_/ / /_/ / /__/ ,< / /_/ / __/ __/ / /__/  __/
/_____/\__,_/\___/_/|_|\____/_/ /_/ /_/\___/\___/
    "#
    );
}
