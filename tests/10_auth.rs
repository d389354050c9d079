mod common;

use anyhow::Result;
use chrono::Duration;
use reqwest::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use school_api::auth::{Claims, JwtKeys};
use school_api::types::Role;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn_server().await?;

    let reply = server.request(Method::GET, "/health", None, None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["status"], "ok");

    let reply = server.request(Method::GET, "/", None, None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["name"], "School API");

    Ok(())
}

#[tokio::test]
async fn login_returns_a_working_token() -> Result<()> {
    let server = common::spawn_server().await?;

    let reply = server
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ROOT@example.com", "password": common::ROOT_PASSWORD})),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["expiresIn"], 24 * 3600);

    let token = reply.data()["token"].as_str().unwrap_or_default().to_string();
    let whoami = server.get("/api/auth/whoami", &token).await?;
    assert_eq!(whoami.status, StatusCode::OK);
    assert_eq!(whoami.data()["role"], "SuperAdmin");
    assert_eq!(whoami.data()["school"], serde_json::Value::Null);
    assert_eq!(whoami.data()["email"], common::ROOT_EMAIL);

    Ok(())
}

#[tokio::test]
async fn bad_credentials_get_one_uniform_answer() -> Result<()> {
    let server = common::spawn_server().await?;

    let wrong_password = server
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": common::ROOT_EMAIL, "password": "nope"})),
        )
        .await?;
    let unknown_email = server
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ghost@example.com", "password": "nope"})),
        )
        .await?;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);

    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() -> Result<()> {
    let server = common::spawn_server().await?;

    let missing = server.request(Method::GET, "/api/schools", None, None).await?;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let malformed = server
        .client
        .get(format!("{}/api/schools", server.base_url))
        .header("Authorization", "Token abc")
        .send()
        .await?;
    assert_eq!(malformed.status(), StatusCode::UNAUTHORIZED);

    let forged = server.get("/api/schools", "not.a.jwt").await?;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    // Right shape, wrong key
    let other_keys = JwtKeys::new("some-other-secret", 1)?;
    let foreign = other_keys.issue(Uuid::new_v4(), Role::SuperAdmin, None)?;
    let reply = server.get("/api/schools", &foreign).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn expired_tokens_are_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let root = server.root_token().await?;
    let whoami = server.get("/api/auth/whoami", &root).await?;
    let root_id: Uuid = whoami.data()["id"].as_str().unwrap_or_default().parse()?;

    let keys = JwtKeys::new(common::TEST_SECRET, 1)?;
    let expired = keys.sign(&Claims::new(root_id, Role::SuperAdmin, None, Duration::hours(-2)))?;

    let reply = server.get("/api/auth/whoami", &expired).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn role_comes_from_the_stored_user_not_the_token() -> Result<()> {
    let server = common::spawn_server().await?;
    let root = server.root_token().await?;
    let school = server.create_school(&root, "North").await?;

    let admin = server.user_token(&root, "SchoolAdmin", &school, "admin@north.edu").await?;
    let whoami = server.get("/api/auth/whoami", &admin).await?;
    assert_eq!(whoami.data()["role"], "SchoolAdmin");
    assert_eq!(whoami.data()["school"], school.as_str());
    let admin_id = whoami.data()["id"].as_str().unwrap_or_default().to_string();

    // Demote; the old token now carries a stale role claim
    let reply = server
        .put(&format!("/api/users/{}", admin_id), &root, json!({"role": "Teacher"}))
        .await?;
    assert_eq!(reply.status, StatusCode::OK);

    let whoami = server.get("/api/auth/whoami", &admin).await?;
    assert_eq!(whoami.data()["role"], "Teacher");

    let reply = server.post("/api/classrooms", &admin, json!({"name": "7B"})).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn deleted_users_lose_access_immediately() -> Result<()> {
    let server = common::spawn_server().await?;
    let root = server.root_token().await?;
    let school = server.create_school(&root, "North").await?;

    let admin = server.user_token(&root, "SchoolAdmin", &school, "admin@north.edu").await?;
    let admin_id = server.get("/api/auth/whoami", &admin).await?.data()["id"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    let reply = server.delete(&format!("/api/users/{}", admin_id), &root).await?;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = server.get("/api/auth/whoami", &admin).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    Ok(())
}
