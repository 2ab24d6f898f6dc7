//! # cubby-core
//!
//! Core crate for the Cubby reminder service. Contains configuration
//! schemas, typed identifiers, the row types exchanged with the storage
//! and push collaborators, the collaborator traits, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other Cubby crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
