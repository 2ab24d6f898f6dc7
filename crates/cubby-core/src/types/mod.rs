//! Core type definitions used across the Cubby workspace.

pub mod id;
pub mod notification;
pub mod push;

pub use id::*;
pub use notification::{EligibleRecipient, TrackerLastEntry};
pub use push::{PushMessage, PushOutcome};
