//! REST backend exposing user registration, login and book CRUD over SQLite.
//!
//! The binary in `main.rs` wires configuration and logging; everything else,
//! including the router used by the integration tests, lives here.

pub mod api;
pub mod cli;
pub mod db;
pub mod errors;
pub mod password;
pub mod schema;
pub mod utils;
