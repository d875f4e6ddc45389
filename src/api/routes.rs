//! API routes configuration module

use crate::api::handlers::{
    create_book, delete_book, delete_user, list_books, login_user, register_user, update_book,
    update_user,
};
use crate::db::Database;
use axum::{
    routing::{post, put},
    Extension, Router,
};

/// Creates and configures the API router with all routes
///
/// # Arguments
/// * `database` - Database connection pool to be shared across handlers
///
/// # Returns
/// * `Router` - Configured router with all API endpoints and middleware
pub fn app(database: Database) -> Router {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/:id", put(update_user).delete(delete_user))
        .route("/login", post(login_user))
        .route("/books", post(create_book).get(list_books))
        .route("/books/:id", put(update_book).delete(delete_book))
        .layer(Extension(database))
}
