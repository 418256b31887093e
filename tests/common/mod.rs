#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tempfile::TempDir;

use case_admin::config::{AppConfig, AuthMode};
use case_admin::{router, AppState};

/// An in-process server on a free port with its own SQLite file.
///
/// The server task lives on the calling test's runtime and stops with it.
pub struct TestServer {
    pub base_url: String,
    client: reqwest::Client,
    _dir: TempDir,
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_with(|_| {}).await
}

pub async fn spawn_with(customize: impl FnOnce(&mut AppConfig)) -> Result<TestServer> {
    let dir = tempfile::tempdir().context("failed to create temp dir")?;
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;

    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;
    config.server.static_dir = None;
    config.database.path = dir.path().join("test.db");
    config.auth.mode = AuthMode::Simple;
    customize(&mut config);

    let bind_addr = config.bind_addr();
    let state = AppState::init(config).await?;
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router(state)).await;
    });

    let server = TestServer {
        base_url: format!("http://{}", bind_addr),
        client: reqwest::Client::new(),
        _dir: dir,
    };
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

impl TestServer {
    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/api/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request with an optional `x-role-code` and JSON body; returns
    /// the status and the parsed JSON body (`Null` when empty or not JSON).
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        role: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut req = self.client.request(method, self.url(path));
        if let Some(role) = role {
            req = req.header("x-role-code", role);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        Ok((status, serde_json::from_str(&text).unwrap_or(Value::Null)))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, Some("admin"), None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, path, Some("admin"), Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, path, Some("admin"), Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, path, Some("admin"), None).await
    }

    /// POST and return `data.id`, failing the test on anything but 201.
    pub async fn create(&self, path: &str, body: Value) -> Result<String> {
        let (status, json) = self.post(path, body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "POST {} -> {}: {}", path, status, json);
        json["data"]["id"]
            .as_str()
            .map(str::to_string)
            .context("created resource has no id")
    }
}
