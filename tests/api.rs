use bookshelf::db::Database;
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, backed by a throwaway database file.
        let path = std::env::temp_dir().join(format!("bookshelf-it-{}.db", uuid::Uuid::new_v4()));
        let database = Database::new(&path.to_string_lossy()).expect("failed to open database");
        let app = bookshelf::api::routes::app(database);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = self.client.request(method, self.url(path));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        let body = res.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PUT, path, Some(body)).await
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(reqwest::Method::GET, path, None).await
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.send(reqwest::Method::DELETE, path, None).await
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/users",
            json!({ "username": username, "email": email, "password": password }),
        )
        .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn register_returns_created_user_without_password() {
    let server = TestServer::spawn().await;

    let (status, body) = server.register("alice", "alice@example.com", "pw").await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].is_i64());
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["role"], "user");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn register_keeps_explicit_role() {
    let server = TestServer::spawn().await;

    let (status, body) = server
        .post(
            "/users",
            json!({
                "username": "root",
                "email": "root@example.com",
                "password": "pw",
                "role": "admin"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let server = TestServer::spawn().await;
    server.register("alice", "alice@example.com", "pw").await;

    let (status, body) = server.register("alice", "other@example.com", "pw").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already exists");

    // The original account is still the only one able to log in.
    let (status, _) = server
        .post("/login", json!({ "email": "other@example.com", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let server = TestServer::spawn().await;
    server.register("alice", "alice@example.com", "pw").await;

    let (status, body) = server.register("bob", "alice@example.com", "pw").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let server = TestServer::spawn().await;
    server.register("alice", "alice@example.com", "pw").await;

    let (wrong_pw_status, wrong_pw) = server
        .post("/login", json!({ "email": "alice@example.com", "password": "nope" }))
        .await;
    let (no_user_status, no_user) = server
        .post("/login", json!({ "email": "ghost@example.com", "password": "pw" }))
        .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_user_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, no_user);
    assert_eq!(wrong_pw["message"], "Invalid email or password");
}

#[tokio::test]
async fn login_success_returns_identity_only() {
    let server = TestServer::spawn().await;
    let (_, created) = server.register("alice", "alice@example.com", "pw").await;

    let (status, body) = server
        .post("/login", json!({ "email": "alice@example.com", "password": "pw" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "Login successful",
            "user": { "id": created["id"], "username": "alice", "email": "alice@example.com" }
        })
    );
}

#[tokio::test]
async fn updated_password_is_hashed_and_usable() {
    let server = TestServer::spawn().await;
    let (_, created) = server.register("alice", "alice@example.com", "old").await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = server
        .put(&format!("/users/{id}"), json!({ "password": "new" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert!(body.get("password").is_none());

    let (status, _) = server
        .post("/login", json!({ "email": "alice@example.com", "password": "new" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server
        .post("/login", json!({ "email": "alice@example.com", "password": "old" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_user_conflicts_and_missing_ids() {
    let server = TestServer::spawn().await;
    let (_, alice) = server.register("alice", "alice@example.com", "pw").await;
    server.register("bob", "bob@example.com", "pw").await;
    let id = alice["id"].as_i64().unwrap();

    let (status, body) = server
        .put(&format!("/users/{id}"), json!({ "username": "bob" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already exists");

    let (status, body) = server.put("/users/9999", json!({ "role": "admin" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn deleting_a_user_twice_fails_the_second_time() {
    let server = TestServer::spawn().await;
    let (_, created) = server.register("alice", "alice@example.com", "pw").await;
    let path = format!("/users/{}", created["id"]);

    let (status, body) = server.delete(&path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, body) = server.delete(&path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, _) = server.delete("/users/4242").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listed_books_round_trip_what_was_created() {
    let server = TestServer::spawn().await;
    let submitted = [
        json!({ "title": "Dune", "author": "Frank Herbert", "description": "Spice" }),
        json!({ "title": "Emma", "author": "Jane Austen", "description": "Matchmaking" }),
        json!({ "title": "Ubik", "author": "Philip K. Dick", "description": null }),
    ];

    let mut created = Vec::new();
    for book in &submitted {
        let (status, body) = server.post("/books", book.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        created.push(body);
    }

    let (status, listed) = server.get("/books").await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), submitted.len());

    for ((book, sent), made) in listed.iter().zip(&submitted).zip(&created) {
        assert_eq!(book["id"], made["id"]);
        assert_eq!(book["title"], sent["title"]);
        assert_eq!(book["author"], sent["author"]);
        assert_eq!(book["description"], sent["description"]);
    }
}

#[tokio::test]
async fn partial_book_update_merges_with_stored_fields() {
    let server = TestServer::spawn().await;
    let (_, created) = server
        .post(
            "/books",
            json!({ "title": "Dune", "author": "Frank Herbert", "description": "Spice" }),
        )
        .await;
    let path = format!("/books/{}", created["id"]);

    let (status, body) = server.put(&path, json!({ "title": "X" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": created["id"],
            "title": "X",
            "author": "Frank Herbert",
            "description": "Spice"
        })
    );

    let (_, listed) = server.get("/books").await;
    assert_eq!(listed, json!([body]));
}

#[tokio::test]
async fn missing_books_are_not_found() {
    let server = TestServer::spawn().await;

    let (status, body) = server.put("/books/77", json!({ "title": "X" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Book not found");

    let (status, _) = server.delete("/books/77").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_book_disappears_from_listing() {
    let server = TestServer::spawn().await;
    let (_, created) = server
        .post(
            "/books",
            json!({ "title": "Dune", "author": "Frank Herbert", "description": "Spice" }),
        )
        .await;

    let (status, body) = server.delete(&format!("/books/{}", created["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book deleted successfully");

    let (_, listed) = server.get("/books").await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn malformed_body_gets_json_error() {
    let server = TestServer::spawn().await;

    let (status, body) = server.post("/books", json!({ "title": "No author" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request body");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn book_without_description_key_is_rejected() {
    let server = TestServer::spawn().await;

    let (status, body) = server
        .post("/books", json!({ "title": "T", "author": "A" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request body");

    let (_, listed) = server.get("/books").await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn non_numeric_ids_get_json_not_found() {
    let server = TestServer::spawn().await;

    for (method, path) in [
        (reqwest::Method::DELETE, "/users/abc"),
        (reqwest::Method::DELETE, "/books/abc"),
    ] {
        let res = server
            .client
            .request(method, server.url(path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            res.headers()[reqwest::header::CONTENT_TYPE],
            "application/json"
        );

        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Resource not found");
        assert!(body["error"].is_string());
    }

    let (status, body) = server.put("/users/abc", json!({ "role": "admin" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Resource not found");
}
