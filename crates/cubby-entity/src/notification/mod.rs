//! Notification ledger entities.

pub mod model;

pub use model::NotificationLog;
