//! Tracker domain entities.

pub mod interval;
pub mod model;

pub use interval::IntervalUnit;
pub use model::Tracker;
