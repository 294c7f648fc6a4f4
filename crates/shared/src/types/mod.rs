//! Common types used across the workspace.

pub mod id;
pub mod pagination;

pub use id::GenerationId;
pub use pagination::{PageMeta, PageRequest, PageResponse};
