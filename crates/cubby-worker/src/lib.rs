//! Due-reminder pipeline for Cubby.
//!
//! This crate provides:
//! - A pure due evaluator for day/month/year intervals
//! - Resolvers for the due set and the eligible recipients
//! - A batch composer grouping reminders per device token
//! - A dispatcher that sends batches and writes the notification ledger
//! - A pass runner and a periodic scheduler driving it

pub mod batch;
pub mod dispatch;
pub mod due;
pub mod error;
pub mod pass;
pub mod recipients;
pub mod resolver;
pub mod scheduler;

pub use batch::{NotificationBatch, compose};
pub use dispatch::{DispatchSummary, Dispatcher};
pub use due::{DueStatus, evaluate};
pub use error::NotifyError;
pub use pass::{NotificationPass, PassReport};
pub use recipients::RecipientResolver;
pub use resolver::DueSetResolver;
pub use scheduler::{NotificationScheduler, SchedulerHandle};
