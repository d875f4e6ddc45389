/// API error types and handling
pub mod errors;
/// JSON body extractor with API-shaped rejections
pub mod extract;
/// HTTP handlers for users, login and books
pub mod handlers;
/// Routes configuration and setup
pub mod routes;
/// HTTP server implementation
pub mod server;
