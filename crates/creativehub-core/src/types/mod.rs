//! Core type definitions used across the CreativeHub workspace.

pub mod id;
pub mod patch;

pub use id::*;
pub use patch::Patch;
