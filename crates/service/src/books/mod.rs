//! Book catalog operations, always scoped to the owning user.
//!
//! The repository takes the owner on every call; a record owned by someone
//! else is indistinguishable from a missing one at this boundary.

pub mod repository;
pub mod service;

pub use service::BookService;
