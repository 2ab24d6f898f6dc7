//! Entry domain entities.

pub mod model;

pub use model::Entry;
