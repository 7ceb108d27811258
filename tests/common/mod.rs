#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;

use recipe_api::auth::JwtKeys;
use recipe_api::config::{AppConfig, DbWaitConfig, JwtConfig, StorageConfig};
use recipe_api::storage::LocalStorage;
use recipe_api::users::{repo, NewUser};
use recipe_api::{build_app, AppState};

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub media: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        recipe_api::db::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        let media = tempfile::tempdir().expect("Failed to create media dir");
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "recipe-api".into(),
                audience: "recipe-api-users".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            storage: StorageConfig::Local {
                root: media.path().to_path_buf(),
            },
            db_wait: DbWaitConfig::default(),
        });
        let storage = Arc::new(LocalStorage::new(media.path()));

        let state = AppState::from_parts(pool.clone(), config.clone(), storage);
        let router = build_app(state);

        Self {
            router,
            db: pool,
            config,
            media,
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create a user in the database and return (user_id, bearer token).
    pub async fn create_user(&self, email: &str) -> (i64, String) {
        let user = repo::create_user(
            &self.db,
            NewUser {
                email: email.into(),
                password: "testpass123".into(),
                name: "Test Name".into(),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to create test user");

        let token = JwtKeys::from(&self.config.jwt)
            .sign_access(user.id)
            .expect("Failed to sign token");
        (user.id, token)
    }

    fn builder(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
    }

    /// Send a GET request with an optional bearer token.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let req = Self::builder("GET", uri, token).body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a JSON body with the given method and an optional bearer token.
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: &Value,
        token: Option<&str>,
    ) -> Response {
        let req = Self::builder(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(req).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value, token: Option<&str>) -> Response {
        self.send_json("POST", uri, body, token).await
    }

    pub async fn put_json(&self, uri: &str, body: &Value, token: Option<&str>) -> Response {
        self.send_json("PUT", uri, body, token).await
    }

    pub async fn patch_json(&self, uri: &str, body: &Value, token: Option<&str>) -> Response {
        self.send_json("PATCH", uri, body, token).await
    }

    /// Send a DELETE request with an optional bearer token.
    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        let req = Self::builder("DELETE", uri, token)
            .body(Body::empty())
            .unwrap();
        self.request(req).await
    }

    /// Send a multipart/form-data body built by [`multipart_body`].
    pub async fn post_multipart(
        &self,
        uri: &str,
        boundary: &str,
        body: Vec<u8>,
        token: Option<&str>,
    ) -> Response {
        let req = Self::builder("POST", uri, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.request(req).await
    }

    /// Create a recipe through the API and return its id.
    pub async fn create_recipe(&self, token: &str, body: Value) -> i64 {
        let resp = self.post_json("/api/recipes", &body, Some(token)).await;
        assert_eq!(resp.status(), axum::http::StatusCode::CREATED);
        body_json(resp).await["id"].as_i64().unwrap()
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(sql).fetch_one(&self.db).await.unwrap();
        n
    }
}

/// Minimal recipe body; extra keys from `extra` override the defaults.
pub fn recipe_body(extra: Value) -> Value {
    let mut body = serde_json::json!({
        "title": "Sample recipe",
        "time_minutes": 22,
        "price": "5.25",
        "description": "Sample description",
        "link": "http://example.com/recipe.pdf",
    });
    if let (Some(base), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    body
}

/// One file field in a multipart body.
pub fn multipart_body(
    boundary: &str,
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

/// Read the full response body as JSON.
pub async fn body_json(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
