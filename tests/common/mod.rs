#![allow(dead_code)]

use std::{fmt, net::SocketAddr};

use anyhow::Context;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use trip_planner::{
    config::AppConfig,
    db::{init_pool, run_migrations},
    routes::create_router,
    state::AppState,
};

pub const MULTIPART_BOUNDARY: &str = "trip-planner-test-boundary";

/// A router over a throwaway SQLite file.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    _root: TempDir,
}

impl fmt::Debug for TestApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestApp").finish()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("response body should be json")
    }

    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .expect("redirect should carry a location")
    }
}

impl TestApp {
    pub async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for test database")?;
        let db_path = root.path().join("trips.sqlite");
        let config = AppConfig {
            database_url: format!("sqlite://{}", db_path.to_string_lossy()),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            secret_key: "test-secret-key-that-is-long-enough-for-sha512".into(),
            google_maps_api_key: None,
        };
        let db = init_pool(&config.database_url).await?;
        run_migrations(&db).await?;
        let state = AppState::new(config, db);
        let router = create_router(state.clone());
        Ok(Self {
            state,
            router,
            _root: root,
        })
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let resp = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("app should handle request");
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .expect("response body should be readable");
        TestResponse {
            status,
            headers,
            body: String::from_utf8(body.to_vec()).expect("response body must be utf-8"),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request build should succeed"),
        )
        .await
    }

    pub async fn json(&self, method: Method, uri: &str, payload: Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request build should succeed"),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .expect("request build should succeed"),
        )
        .await
    }

    /// Posts an url-encoded form body such as `title=Visa&description=`.
    pub async fn form(&self, uri: &str, body: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .expect("request build should succeed"),
        )
        .await
    }

    pub async fn upload_csv(&self, uri: &str, csv: &str) -> TestResponse {
        let body = format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"activities.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{MULTIPART_BOUNDARY}--\r\n"
        );
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
                )
                .body(Body::from(body))
                .expect("request build should succeed"),
        )
        .await
    }

    /// Creates a trip through the JSON API and returns its id.
    pub async fn create_trip(&self, destination: &str, start: &str, end: &str) -> i64 {
        let resp = self
            .json(
                Method::POST,
                "/api/trips",
                serde_json::json!({
                    "destination": destination,
                    "startDate": start,
                    "endDate": end,
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        resp.json()["id"].as_i64().expect("trip id")
    }
}

/// A bulk-import record in the `MM/DD/YYYY` + `H:MM AM` layout.
pub fn bulk_record(title: &str, date: &str, start: &str, end: &str) -> Value {
    serde_json::json!({
        "title": title,
        "date": date,
        "start_time": start,
        "end_time": end,
        "location": "Vietnam",
        "description": null,
        "category": "Sightseeing",
        "price": 10,
    })
}
