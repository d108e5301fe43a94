//! # creativehub-entity
//!
//! Domain entity models for CreativeHub. Every struct in this crate
//! represents a database table row or a domain value object. Table rows
//! additionally derive `sqlx::FromRow`.

pub mod asset;
pub mod batch;
pub mod copy;
pub mod regeneration;
