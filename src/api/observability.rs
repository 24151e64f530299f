//! Request span, HTTP metrics, and response hardening.
//!
//! Every request runs inside a `request` span. Once a handler has resolved
//! the caller, [`record_identity`] fills in who they are, so every event
//! logged while serving the request is attributable to an account.

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{Instrument, Span, field, info, info_span};
use uuid::Uuid;

use crate::domain::{Role, UserId};

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const HARDENING_HEADERS: [(HeaderName, &str); 4] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "same-origin"),
    (header::CACHE_CONTROL, "no-store"),
];

/// How the caller proved who they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVia {
    Session,
    TvToken,
}

impl AuthVia {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::TvToken => "tv_token",
        }
    }
}

/// Attaches the resolved caller to the enclosing `request` span.
pub fn record_identity(user_id: UserId, role: Role, via: AuthVia) {
    let span = Span::current();
    span.record("user_id", user_id.value());
    span.record("role", role.code());
    span.record("auth", via.as_str());
}

pub async fn request_span_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = Uuid::new_v4();
    let method = req.method().clone();

    // Raw paths carry user ids; label metrics by route template only.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or("unmatched", MatchedPath::as_str)
        .to_string();

    let span = info_span!(
        "request",
        %request_id,
        %method,
        path = %req.uri().path(),
        user_id = field::Empty,
        role = field::Empty,
        auth = field::Empty,
    );

    let mut response = next.run(req).instrument(span.clone()).await;
    let status = response.status();
    let elapsed = started.elapsed();

    let labels = [
        ("method", method.to_string()),
        ("route", route),
        ("status", status.as_u16().to_string()),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels).record(elapsed.as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID, value);
    }

    span.in_scope(|| {
        info!(
            status = status.as_u16(),
            outcome = outcome(status),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Request finished"
        );
    });

    response
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    for (name, value) in HARDENING_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    response
}

fn outcome(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else if status.is_client_error() {
        "client_error"
    } else if status.is_redirection() {
        "redirect"
    } else {
        "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware, routing::get};
    use std::io;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    async fn whoami() -> &'static str {
        record_identity(UserId::new(7), Role::Physician, AuthVia::Session);
        info!("Serving page");
        "ok"
    }

    fn app() -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(middleware::from_fn(request_span_middleware))
    }

    #[test]
    fn test_outcome_classes() {
        assert_eq!(outcome(StatusCode::OK), "success");
        assert_eq!(outcome(StatusCode::SEE_OTHER), "redirect");
        assert_eq!(outcome(StatusCode::FORBIDDEN), "client_error");
        assert_eq!(outcome(StatusCode::SERVICE_UNAVAILABLE), "error");
    }

    #[tokio::test]
    async fn test_response_is_hardened_and_tagged() {
        let response = app()
            .oneshot(axum::http::Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert!(response.headers().contains_key(REQUEST_ID));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_handler_identity_lands_on_request_span() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        app()
            .oneshot(axum::http::Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let served = output
            .lines()
            .find(|line| line.contains("Serving page"))
            .unwrap();
        assert!(served.contains("user_id=7"));
        assert!(served.contains("role=\"physician\"") || served.contains("role=physician"));
        assert!(served.contains("auth=\"session\"") || served.contains("auth=session"));
    }
}
