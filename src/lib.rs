// Library exports for Quill
// This allows integration tests and the binary to share the application

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod humanize;
pub mod pagination;
pub mod posts;
pub mod routes;
pub mod state;
