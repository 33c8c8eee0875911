//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and token handling live here; the HTTP layer only
//! maps inputs and errors.

pub mod domain;
pub mod errors;
pub mod password;
pub mod repo;
pub mod repository;
pub mod service;
pub mod token;

pub use service::AuthService;
