#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::Value;
use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

use ledgerline::config::AccessConfig;
use ledgerline::db::LedgerStorage;
use ledgerline::router::{LedgerState, ledger_router};

pub const ALICE: &str = "alice-token";
pub const BOB: &str = "bob-token";

pub struct TestApp {
    pub app: Router,
    pub state: LedgerState,
    path: PathBuf,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_access(AccessConfig::default()).await
    }

    pub async fn with_access(access: AccessConfig) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();

        let mut path = std::env::temp_dir();
        path.push(format!(
            "ledgerline-test-{}-{}.sqlite",
            std::process::id(),
            nanos
        ));

        let database_url = format!("sqlite://{}", path.display());
        let storage = LedgerStorage::connect(&database_url)
            .await
            .expect("failed to open test database");
        let state = LedgerState::new(storage, access);
        state
            .users
            .ensure_user("alice", ALICE)
            .await
            .expect("failed to seed alice");
        state
            .users
            .ensure_user("bob", BOB)
            .await
            .expect("failed to seed bob");

        let app = ledger_router(state.clone());
        Self { app, state, path }
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let resp = self.app.clone().oneshot(request).await.expect("request failed");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body was not JSON")
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send("PATCH", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, Some(token), None).await
    }

    /// POST and return the created row's id, asserting 201.
    pub async fn create(&self, resource: &str, token: &str, body: Value) -> i64 {
        let (status, value) = self
            .post(&format!("/api/finance/{resource}"), token, body)
            .await;
        assert_eq!(status, StatusCode::CREATED, "create {resource} failed: {value}");
        value["id"].as_i64().expect("created row has no id")
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let rec: (i64,) = sqlx::query_as(&sql)
            .fetch_one(self.state.storage.pool())
            .await
            .expect("count query failed");
        rec.0
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
