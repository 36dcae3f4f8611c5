/*!
 * # Authentication
 *
 * Bearer JWT authentication for the reservation API.
 *
 * - `/auth/login` exchanges an email and password for an HS256 access token
 * - `/auth/register` creates an account and returns a token for it
 * - `auth_middleware` validates the token on every protected route and stores
 *   the caller as an [`AuthUser`] request extension
 */

use crate::{
    config::AppConfig,
    db::DbPool,
    entities::user,
    errors::ServiceError,
    services::users::{UserInput, UserService},
    ApiResponse,
};
use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod password;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Subject (user ID)
    pub email: String, // User's email
    pub jti: String,   // JWT ID (unique identifier for this token)
    pub iat: i64,      // Issued at time
    pub exp: i64,      // Expiration time
    pub iss: String,   // Issuer
    pub aud: String,   // Audience
}

/// The authenticated caller, resolved from the bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub token_id: String,
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        )
    }
}

/// Issued access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until expiry
    pub expires_in: i64,
    pub user: user::Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginCredentials {
    #[schema(example = "ada@example.org")]
    pub email: String,
    #[schema(write_only)]
    pub password: String,
}

/// Authentication service that handles credential checks and token issuance
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    users: UserService,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>) -> Self {
        Self {
            config,
            users: UserService::new(db),
        }
    }

    /// Generate a JWT for a user
    pub fn generate_token(&self, user: &user::Model) -> Result<TokenResponse, AuthError> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.access_token_expiration)
            .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: ttl.num_seconds(),
            user: user.clone(),
        })
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.jwt_audience]);
        validation.set_issuer(&[&self.config.jwt_issuer]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Checks an email and password pair and issues a token
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<TokenResponse, AuthError> {
        let user = self
            .users
            .find_by_email(&credentials.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(&credentials.password, &user.password_hash) {
            warn!(user_id = user.id, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = user.id, "user logged in");
        self.generate_token(&user)
    }

    /// Creates an account and issues a token for it
    pub async fn register(&self, input: UserInput) -> Result<TokenResponse, AuthError> {
        let user = self.users.create(input).await?;
        self.generate_token(&user)
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, String) = match self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required".to_string(),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::TokenCreation(msg) => {
                tracing::error!(error = %msg, "token creation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AUTH_TOKEN_CREATION_FAILED",
                    "Token creation failed".to_string(),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!(error = %msg, "authentication failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AUTH_INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
            Self::Service(err) => return err.into_response(),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("Authentication service not available".to_string())
                .into_response();
        }
    };

    match extract_auth_from_headers(request.headers(), &auth_service) {
        Ok(user) => {
            debug!(user_id = user.user_id, "request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extract authentication info from request headers
fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingAuth)?;

    let claims = auth_service.validate_token(token)?;
    let user_id = claims.sub.parse::<i32>().map_err(|_| AuthError::InvalidToken)?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
        token_id: claims.jti,
    })
}

/// Authentication routes
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    axum::Router::new()
        .route("/login", axum::routing::post(login_handler))
        .route("/register", axum::routing::post(register_handler))
        .layer(DefaultBodyLimit::max(1024 * 64)) // 64KB limit
}

/// Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginCredentials>,
) -> Result<Json<ApiResponse<TokenResponse>>, AuthError> {
    let token = auth_service.login(&credentials).await?;
    Ok(Json(ApiResponse::success(token)))
}

/// Create an account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = UserInput,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 422, description = "Validation failed", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(input): Json<UserInput>,
) -> Result<impl IntoResponse, AuthError> {
    let token = auth_service.register(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(token))))
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }
}
