#![allow(dead_code)]

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use manip_api::{
    build_router,
    config::AppConfig,
    db,
    entities::{equipment, location, user},
    services::{
        categories::CategoryInput, equipment_groups::EquipmentGroupInput,
        equipments::EquipmentInput, locations::LocationInput, sites::SiteInput,
        users::UserInput,
    },
    AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str =
    "integration_test_secret_that_is_comfortably_longer_than_sixty_four_characters";

/// Helper harness running the full router on a throwaway SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    pub user: user::Model,
    _dir: TempDir,
}

/// Minimal catalog used by reservation tests
pub struct Catalog {
    pub location: location::Model,
    pub microscope: equipment::Model,
    pub centrifuge: equipment::Model,
    pub spectrometer: equipment::Model,
}

pub struct JsonResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl JsonResponse {
    /// `data` of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// Messages recorded for `field` in a 422 body
    pub fn field_errors(&self, field: &str) -> Vec<String> {
        self.body["errors"][field]
            .as_array()
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(|m| m.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_pool_size(1).await
    }

    /// Same as [`TestApp::new`] with `connections` pooled SQLite connections,
    /// so concurrent requests run in separate transactions.
    pub async fn with_pool_size(connections: u32) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("manips.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "development".to_string(),
        );
        cfg.db_max_connections = connections;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = build_router(state.clone()).expect("router builds");

        let user = state
            .services
            .users
            .create(user_input("Owner", "owner@example.org"))
            .await
            .expect("seed default user");
        let token = state
            .auth
            .generate_token(&user)
            .expect("mint token")
            .access_token;

        Self {
            router,
            state,
            token,
            user,
            _dir: dir,
        }
    }

    /// Access the bearer token for the default user.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn token_for(&self, user: &user::Model) -> String {
        self.state
            .auth
            .generate_token(user)
            .expect("mint token")
            .access_token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> JsonResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        JsonResponse { status, body }
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> JsonResponse {
        self.request(method, uri, body, Some(self.token())).await
    }

    pub async fn get(&self, uri: &str) -> JsonResponse {
        self.request_authenticated(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> JsonResponse {
        self.request_authenticated(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> JsonResponse {
        self.request_authenticated(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> JsonResponse {
        self.request_authenticated(Method::DELETE, uri, None).await
    }

    pub async fn seed_user(&self, first_name: &str, email: &str) -> user::Model {
        self.state
            .services
            .users
            .create(user_input(first_name, email))
            .await
            .expect("seed user")
    }

    /// One site and location, with three equipments in one group
    pub async fn seed_catalog(&self) -> Catalog {
        let services = &self.state.services;
        let site = services
            .sites
            .create(SiteInput {
                name: Some("North campus".into()),
            })
            .await
            .expect("seed site");
        let location = services
            .locations
            .create(LocationInput {
                name: Some("Room 101".into()),
                site_id: Some(site.id),
            })
            .await
            .expect("seed location");
        let category = services
            .categories
            .create(CategoryInput {
                name: Some("Optics".into()),
            })
            .await
            .expect("seed category");
        let group = services
            .equipment_groups
            .create(EquipmentGroupInput {
                name: Some("Imaging".into()),
                category_id: Some(category.id),
            })
            .await
            .expect("seed equipment group");

        let mut equipments = Vec::new();
        for name in ["Microscope", "Centrifuge", "Spectrometer"] {
            equipments.push(
                services
                    .equipments
                    .create(EquipmentInput {
                        name: Some(name.into()),
                        equipment_group_id: Some(group.id),
                        operational: None,
                    })
                    .await
                    .expect("seed equipment"),
            );
        }
        let spectrometer = equipments.pop().expect("three equipments");
        let centrifuge = equipments.pop().expect("three equipments");
        let microscope = equipments.pop().expect("three equipments");

        Catalog {
            location,
            microscope,
            centrifuge,
            spectrometer,
        }
    }
}

pub fn user_input(first_name: &str, email: &str) -> UserInput {
    UserInput {
        first_name: Some(first_name.into()),
        last_name: Some("Tester".into()),
        email: Some(email.into()),
        password: Some("correct-horse-battery".into()),
        color: None,
    }
}
