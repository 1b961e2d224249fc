//! Utilities - logging, request validation and extractors
//!
//! Error and response types come from `shared::error`.

pub mod extract;
pub mod logger;
pub mod validation;

pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode, FieldError};
