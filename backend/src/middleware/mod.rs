//! Middleware for Farm GAP Records

pub mod auth;

pub use auth::{auth_middleware, AuthUser};
