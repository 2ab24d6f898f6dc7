//! Collaborator traits defined in `cubby-core` and implemented by other crates.

pub mod notification_store;
pub mod push_gateway;

pub use notification_store::NotificationStore;
pub use push_gateway::PushGateway;
