//! Repository implementations for Cubby tables.

pub mod notification;
pub mod push_token;
pub mod tracker;

pub use notification::NotificationLogRepository;
pub use push_token::PushTokenRepository;
pub use tracker::TrackerRepository;
