//! Convenience result type alias for CreativeHub.

use crate::error::AppError;

/// A specialized `Result` type for CreativeHub operations.
pub type AppResult<T> = Result<T, AppError>;
