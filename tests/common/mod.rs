#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use jwt_pizza_service::app::{router, AppState};
use jwt_pizza_service::auth::password::hash_password;
use jwt_pizza_service::config::{AppConfig, Environment};
use jwt_pizza_service::database::models::{NewUser, RoleGrant};
use jwt_pizza_service::database::{MemoryGateway, UserRepository};
use jwt_pizza_service::metrics::MetricsRegistry;

/// The full router over an in-memory gateway, driven without a socket.
pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<MemoryGateway>,
    pub metrics: Arc<MetricsRegistry>,
}

pub struct Session {
    pub user: Value,
    pub token: String,
}

impl Session {
    pub fn id(&self) -> i64 {
        self.user["id"].as_i64().unwrap_or_default()
    }
}

impl TestApp {
    pub fn spawn() -> Self {
        let mut config = AppConfig::for_environment(Environment::Development);
        config.security.bcrypt_cost = 4;
        config.security.jwt_secret = "integration-test-secret".to_string();

        let gateway = Arc::new(MemoryGateway::new());
        let metrics = Arc::new(MetricsRegistry::new("jwt-pizza-service-test").expect("metrics registry"));
        let state = AppState::new(gateway.clone(), metrics.clone(), config).expect("app state");

        Self {
            router: router(state),
            gateway,
            metrics,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let request = match body {
            Some(body) => self.request_builder(method, path, token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => self.request_builder(method, path, token).body(Body::empty())?,
        };
        let (status, _, value) = self.send(request).await?;
        Ok((status, value))
    }

    /// Sends `body` as-is, for payloads that are not valid JSON.
    pub async fn request_raw(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: &str,
    ) -> Result<(StatusCode, HeaderMap, Value)> {
        let request = self
            .request_builder(method, path, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?;
        self.send(request).await
    }

    fn request_builder(&self, method: Method, path: &str, token: Option<&str>) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match token {
            Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn send(&self, request: Request<Body>) -> Result<(StatusCode, HeaderMap, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| {
                format!("non-JSON response body: {}", String::from_utf8_lossy(&bytes))
            })?
        };
        Ok((status, headers, value))
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth",
                None,
                Some(json!({ "name": name, "email": email, "password": password })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "register failed: {} {}", status, body);
        Ok(session_from(&body))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let (status, body) = self
            .request(
                Method::PUT,
                "/api/auth",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        Ok(session_from(&body))
    }

    /// Admins cannot be created over HTTP, so they go straight into the gateway.
    pub async fn admin(&self, email: &str) -> Result<Session> {
        self.gateway
            .add_user(NewUser {
                name: "pizza admin".to_string(),
                email: email.to_string(),
                password_hash: hash_password("admin", 4).await?,
                roles: vec![RoleGrant::admin()],
            })
            .await?;
        self.login(email, "admin").await
    }
}

fn session_from(body: &Value) -> Session {
    Session {
        user: body["data"]["user"].clone(),
        token: body["data"]["token"].as_str().unwrap_or_default().to_string(),
    }
}
