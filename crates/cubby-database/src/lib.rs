//! # cubby-database
//!
//! PostgreSQL connection management, repositories for trackers, push
//! tokens and the notification ledger, and the two
//! [`NotificationStore`](cubby_core::traits::NotificationStore)
//! implementations (PostgreSQL and in-memory).

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryNotificationStore;
pub use store::PgNotificationStore;
