use anyhow::{anyhow, Context};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use crate::types::EntityType;

/// Thin HTTP client over the API's `{success, data}` envelope
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("school-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<Value> {
        let request = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        self.send(request).await
    }

    pub async fn list(&self, entity: EntityType, filters: &[(String, String)]) -> anyhow::Result<Value> {
        let request = self
            .http
            .get(self.url(&format!("/api/{}", entity.collection())))
            .query(filters);
        self.send(self.authorized(request)?).await
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let request = self.http.get(self.url(path));
        self.send(self.authorized(request)?).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(self.authorized(request)?).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let request = self.http.put(self.url(path)).json(body);
        self.send(self.authorized(request)?).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        let request = self.http.delete(self.url(path));
        self.send(self.authorized(request)?).await
    }

    fn authorized(&self, request: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("no token: run `school login` and set SCHOOL_API_TOKEN or pass --token"))?;
        Ok(request.bearer_auth(token))
    }

    /// Send and unwrap the envelope. Error bodies become the error message.
    async fn send(&self, request: RequestBuilder) -> anyhow::Result<Value> {
        let response = request.send().await.context("request failed")?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"));
            return Err(anyhow!("{} ({})", message, status.as_u16()));
        }

        Ok(body.get("data").cloned().unwrap_or(body))
    }
}
