//! Convenience result type alias for Cubby.

use crate::error::AppError;

/// A specialized `Result` type for Cubby operations.
pub type AppResult<T> = Result<T, AppError>;
