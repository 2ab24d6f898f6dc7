//! # cubby-entity
//!
//! Domain entity models for Cubby. Every struct in this crate represents
//! a database table row or a domain value object. Database entities
//! derive `sqlx::FromRow`.

pub mod entry;
pub mod notification;
pub mod push_token;
pub mod tracker;
