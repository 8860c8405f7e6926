//! taskboard — a small task/user CRUD service and its client.
//!
//! Server side: `store` (redb) → `api` (axum handlers).
//! Client side: `client` (reqwest wrapper) → `pages` (screen controllers).
//! `models` holds the entities and wire DTOs shared by both halves.

pub mod api;
pub mod client;
pub mod error;
pub mod models;
pub mod pages;
pub mod settings;
pub mod store;
