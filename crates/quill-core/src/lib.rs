//! # Quill Core
//!
//! The domain layer of the Quill blog backend.
//! Entities, ports and the slug/pagination helpers, with zero
//! infrastructure dependencies.

pub mod domain;
pub mod pagination;
pub mod ports;
pub mod slug;
