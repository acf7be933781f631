//! Persistence layer for Mersal user accounts.
//!
//! Exposes the [`model::user::User`] entity, the MongoDB-backed
//! [`repository::user_repo::UserRepository`], and the supporting
//! configuration and password-hashing utilities. The HTTP surface,
//! session handling, and presence propagation live in the consuming
//! service, not here.

pub mod config;
pub mod model;
pub mod repository;
pub mod util;
