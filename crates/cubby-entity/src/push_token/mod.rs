//! Push token domain entities.

pub mod model;
pub mod platform;

pub use model::PushToken;
pub use platform::Platform;
