//! Shared types for the back office
//!
//! Error codes, the API response envelope and the data models used by
//! backoffice-server and its clients.

pub mod error;
pub mod models;
pub mod serde_helpers;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
