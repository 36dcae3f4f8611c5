use crate::tracing::RequestId;
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Client supplied id when it passes [`RequestId::from_header`], a fresh one otherwise
pub fn resolve_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::from_header)
        .unwrap_or_default()
}

fn stamp(headers: &mut HeaderMap, value: &HeaderValue) {
    headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value.clone());
}

/// Tags the request, its log span and the response with one request id.
///
/// Handlers can read it as `Extension<RequestId>` or through
/// [`crate::tracing::current_request_id`].
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(request.headers());
    let value = HeaderValue::from_str(request_id.as_str()).ok();

    if let Some(value) = &value {
        stamp(request.headers_mut(), value);
    }
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = crate::tracing::scope_request_id(request_id, next.run(request))
        .instrument(span)
        .await;

    if let Some(value) = &value {
        stamp(response.headers_mut(), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        extract::Extension,
        http::Request as HttpRequest,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn echo(Extension(request_id): Extension<RequestId>) -> String {
        let scoped = crate::tracing::current_request_id()
            .map(|r| r.0)
            .unwrap_or_default();
        format!("{}|{}", request_id, scoped)
    }

    async fn send(header: Option<&str>) -> (Option<String>, String) {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(REQUEST_ID_HEADER, value);
        }
        let response = Router::new()
            .route("/", get(echo))
            .layer(axum::middleware::from_fn(request_id_middleware))
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (header, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn generated_id_is_echoed_and_scoped() {
        let (header, body) = send(None).await;
        let id = header.expect("response carries an id");
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(body, format!("{}|{}", id, id));
    }

    #[tokio::test]
    async fn client_id_is_kept() {
        let (header, body) = send(Some("client-42")).await;
        assert_eq!(header.as_deref(), Some("client-42"));
        assert_eq!(body, "client-42|client-42");
    }

    #[tokio::test]
    async fn unusable_client_id_is_replaced() {
        let long = "x".repeat(300);
        let (header, _) = send(Some(&long)).await;
        let id = header.expect("response carries an id");
        assert_ne!(id, long);
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}
