//! Typed client for the companion REST backend.

pub mod api_types;
pub mod client;

pub use api_types::{NewFavorite, Pagination, Registration, ResourceKind};
pub use client::BackendClient;
