//! Manip API Library
//!
//! Reservation backend for laboratory equipment: sites and locations, the
//! equipment catalog, users, saved equipment preferences and manips (time-boxed
//! reservations checked against opening hours and equipment conflicts).
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;
pub mod validation;

use axum::{http::HeaderValue, Extension, Router};
use chrono::Utc;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::ToSchema;

use crate::auth::{AuthRouterExt, AuthService};
use crate::db::DbPool;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Wires every service on top of one shared pool
    pub fn new(db: Arc<DbPool>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config.booking);
        let auth = Arc::new(AuthService::new(
            auth::AuthConfig::from(&config),
            db.clone(),
        ));
        Self {
            db,
            config,
            services,
            auth,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}


/// Resource routes mounted under `/api`, all behind bearer authentication
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(handlers::sites::site_routes())
        .merge(handlers::locations::location_routes())
        .merge(handlers::categories::category_routes())
        .merge(handlers::equipment_groups::equipment_group_routes())
        .merge(handlers::equipments::equipment_routes())
        .merge(handlers::users::user_routes())
        .merge(handlers::preferences::preference_routes())
        .merge(handlers::manips::manip_routes())
        .with_auth()
}

/// CORS policy from configuration: explicit origins first, then the
/// permissive development fallback
pub fn cors_layer(cfg: &config::AppConfig) -> anyhow::Result<CorsLayer> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(cfg.cors_allow_credentials))
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        Ok(CorsLayer::permissive())
    } else {
        anyhow::bail!(
            "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
        )
    }
}

/// Full HTTP application: health, docs, public auth routes and the protected API
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config)?;
    let auth_service = state.auth.clone();
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    let api = api_routes().layer(axum::middleware::from_fn(
        middleware_helpers::security_headers::security_headers_middleware,
    ));

    Ok(Router::new()
        .merge(health::health_routes())
        .nest("/api", api)
        .nest(
            "/api/auth",
            auth::auth_routes().with_state(auth_service.clone()),
        )
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        // auth_middleware reads the service from request extensions
        .layer(Extension(auth_service))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state))
}
