#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{redirect, Method, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use school_api::config::AppConfig;
use school_api::database::{DocumentStore, MemoryStore};
use school_api::services::ensure_super_admin;
use school_api::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const ROOT_EMAIL: &str = "root@example.com";
pub const ROOT_PASSWORD: &str = "rootpass";

/// A running server on an ephemeral port, backed by its own in-memory store.
/// The server task lives as long as the test's runtime.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<dyn DocumentStore>,
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(|_| {}).await
}

pub async fn spawn_server_with(configure: impl FnOnce(&mut AppConfig)) -> Result<TestServer> {
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    config.bootstrap.admin_email = Some(ROOT_EMAIL.to_string());
    config.bootstrap.admin_password = Some(ROOT_PASSWORD.to_string());
    configure(&mut config);

    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    ensure_super_admin(store.as_ref(), &config.bootstrap).await?;

    let state = AppState::new(config, store.clone())?;
    let app = school_api::app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    // Redirects are asserted on, never followed
    let client = reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .build()?;

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        client,
        store,
    })
}

/// Status and parsed JSON body (Null when the body is empty or not JSON)
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub location: Option<String>,
}

impl Reply {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn id(&self) -> String {
        self.body["data"]["id"].as_str().unwrap_or_default().to_string()
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

impl TestServer {
    pub async fn request(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<Reply> {
        let mut request = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        Ok(Reply { status, body, location })
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<Reply> {
        self.request(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<Reply> {
        self.request(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<Reply> {
        self.request(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<Reply> {
        self.request(Method::DELETE, path, Some(token), None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let reply = self
            .request(Method::POST, "/api/auth/login", None, Some(json!({"email": email, "password": password})))
            .await?;
        anyhow::ensure!(reply.status == StatusCode::OK, "login failed: {} {}", reply.status, reply.body);
        reply.data()["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    pub async fn root_token(&self) -> Result<String> {
        self.login(ROOT_EMAIL, ROOT_PASSWORD).await
    }

    /// POST and insist on 201, returning the new record's id
    pub async fn create(&self, path: &str, token: &str, body: Value) -> Result<String> {
        let reply = self.post(path, token, body).await?;
        anyhow::ensure!(
            reply.status == StatusCode::CREATED,
            "create {} failed: {} {}",
            path,
            reply.status,
            reply.body
        );
        Ok(reply.id())
    }

    pub async fn create_school(&self, root: &str, name: &str) -> Result<String> {
        self.create(
            "/api/schools",
            root,
            json!({"name": name, "address": format!("{} Road", name), "contactNumber": "0123456789"}),
        )
        .await
    }

    pub async fn create_classroom(&self, token: &str, school: &str, name: &str) -> Result<String> {
        self.create("/api/classrooms", token, json!({"name": name, "school": school})).await
    }

    pub async fn create_student(&self, token: &str, school: &str, classroom: &str, email: &str) -> Result<String> {
        self.create(
            "/api/students",
            token,
            json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": email,
                "school": school,
                "classroom": classroom
            }),
        )
        .await
    }

    /// Create a user in `school` with `role` and return a token for them
    pub async fn user_token(&self, root: &str, role: &str, school: &str, email: &str) -> Result<String> {
        self.create(
            "/api/users",
            root,
            json!({"name": role, "email": email, "password": "password", "role": role, "school": school}),
        )
        .await?;
        self.login(email, "password").await
    }
}

/// One SuperAdmin and two schools, each with an admin and a classroom
pub struct TwoSchools {
    pub server: TestServer,
    pub root: String,
    pub north: String,
    pub south: String,
    pub north_admin: String,
    pub south_admin: String,
    pub north_room: String,
    pub south_room: String,
}

pub async fn two_schools() -> Result<TwoSchools> {
    two_schools_with(|_| {}).await
}

pub async fn two_schools_with(configure: impl FnOnce(&mut AppConfig)) -> Result<TwoSchools> {
    let server = spawn_server_with(configure).await?;
    let root = server.root_token().await?;

    let north = server.create_school(&root, "North").await?;
    let south = server.create_school(&root, "South").await?;
    let north_admin = server.user_token(&root, "SchoolAdmin", &north, "admin@north.edu").await?;
    let south_admin = server.user_token(&root, "SchoolAdmin", &south, "admin@south.edu").await?;
    let north_room = server.create_classroom(&root, &north, "7B").await?;
    let south_room = server.create_classroom(&root, &south, "9A").await?;

    Ok(TwoSchools {
        server,
        root,
        north,
        south,
        north_admin,
        south_admin,
        north_room,
        south_room,
    })
}
