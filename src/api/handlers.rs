use crate::api::errors::{from_error, ApiError};
use crate::api::extract::{ApiJson, ApiPath};
use crate::db::{
    Book, BookPatch, BookRepository, Database, User, UserPatch, UserRepository, DEFAULT_ROLE,
};
use crate::errors::Error;
use axum::http::StatusCode;
use axum::{extract::Extension, Json};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

/// Request payload for registering a user
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Request payload for logging in
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request payload for creating a book
#[derive(Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    /// The key is required; its value may be `null`
    #[serde(deserialize_with = "nullable")]
    pub description: Option<String>,
}

/// Deserializes an `Option` without serde's implicit "missing means `None`"
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

/// Public view of a user; the password hash is not part of it
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        BookResponse {
            id: book.id,
            title: book.title,
            author: book.author,
            description: book.description,
        }
    }
}

/// Identity returned on a successful login
#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: i32,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Registers a new user
///
/// # Returns
/// * `201` with the created user, or `400` when the username or email is taken
#[axum::debug_handler]
pub async fn register_user(
    Extension(database): Extension<Database>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = database
        .run_blocking(move |conn| {
            let role = payload.role.as_deref().unwrap_or(DEFAULT_ROLE);
            UserRepository::new(conn).create_user(
                &payload.username,
                &payload.email,
                &payload.password,
                role,
            )
        })
        .await
        .map_err(|e| from_error(e, "Error adding user"))?;

    info!(user_id = user.id, "Registered user");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Checks a user's email and password
///
/// No session is issued; the caller only learns who the credentials belong to.
#[axum::debug_handler]
pub async fn login_user(
    Extension(database): Extension<Database>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = database
        .run_blocking(move |conn| {
            UserRepository::new(conn).verify_credentials(&payload.email, &payload.password)
        })
        .await
        .map_err(|e| {
            if matches!(e, Error::InvalidCredentials) {
                warn!("Rejected login attempt");
            }
            from_error(e, "Error logging in")
        })?;

    info!(user_id = user.id, "User logged in");
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user: LoginUser {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    }))
}

/// Applies a partial update to a user
#[axum::debug_handler]
pub async fn update_user(
    ApiPath(id): ApiPath<i32>,
    Extension(database): Extension<Database>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = database
        .run_blocking(move |conn| UserRepository::new(conn).update_user(id, patch))
        .await
        .map_err(|e| from_error(e, "Error updating user"))?;

    info!(user_id = user.id, "Updated user");
    Ok(Json(user.into()))
}

#[axum::debug_handler]
pub async fn delete_user(
    ApiPath(id): ApiPath<i32>,
    Extension(database): Extension<Database>,
) -> Result<Json<MessageResponse>, ApiError> {
    database
        .run_blocking(move |conn| UserRepository::new(conn).delete_user(id))
        .await
        .map_err(|e| from_error(e, "Error deleting user"))?;

    info!(user_id = id, "Deleted user");
    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

#[axum::debug_handler]
pub async fn create_book(
    Extension(database): Extension<Database>,
    ApiJson(payload): ApiJson<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let book = database
        .run_blocking(move |conn| {
            BookRepository::new(conn).create_book(
                &payload.title,
                &payload.author,
                payload.description.as_deref(),
            )
        })
        .await
        .map_err(|e| from_error(e, "Error adding book"))?;

    info!(book_id = book.id, "Created book");
    Ok((StatusCode::CREATED, Json(book.into())))
}

/// Lists every book
#[axum::debug_handler]
pub async fn list_books(
    Extension(database): Extension<Database>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = database
        .run_blocking(|conn| BookRepository::new(conn).list_books())
        .await
        .map_err(|e| from_error(e, "Error fetching books"))?;

    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// Applies a partial update to a book
#[axum::debug_handler]
pub async fn update_book(
    ApiPath(id): ApiPath<i32>,
    Extension(database): Extension<Database>,
    ApiJson(patch): ApiJson<BookPatch>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = database
        .run_blocking(move |conn| BookRepository::new(conn).update_book(id, patch))
        .await
        .map_err(|e| from_error(e, "Error updating book"))?;

    info!(book_id = book.id, "Updated book");
    Ok(Json(book.into()))
}

#[axum::debug_handler]
pub async fn delete_book(
    ApiPath(id): ApiPath<i32>,
    Extension(database): Extension<Database>,
) -> Result<Json<MessageResponse>, ApiError> {
    database
        .run_blocking(move |conn| BookRepository::new(conn).delete_book(id))
        .await
        .map_err(|e| from_error(e, "Error deleting book"))?;

    info!(book_id = id, "Deleted book");
    Ok(Json(MessageResponse {
        message: "Book deleted successfully".to_string(),
    }))
}
