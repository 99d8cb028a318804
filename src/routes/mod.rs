//! Router assembly: user and common routes behind the middleware stack.

mod common;
mod users;

pub use common::common_routes;
pub use users::user_routes;

use crate::config::ServerConfig;
use crate::middleware::{process_time, request_id, PROCESS_TIME_HEADER, REQUEST_ID_HEADER};
use crate::state::AppState;
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::from_fn,
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Full application. Layers, outermost first: request id, trace span, CORS,
/// process time, body limit, timeout.
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request| {
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "request",
            method = %req.method(),
            uri = %req.uri(),
            request_id = %request_id,
        )
    });

    Router::new()
        .merge(common_routes())
        .merge(user_routes())
        .layer(TimeoutLayer::new(server.request_timeout))
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(from_fn(process_time))
        .layer(cors_layer(&server.cors_origins))
        .layer(trace)
        .layer(from_fn(request_id))
        .with_state(state)
}

/// Explicit origin allow-list with credentials; methods and headers mirror the preflight.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) if origin != "*" => Some(v),
            _ => {
                tracing::warn!(origin = %origin, "ignoring unusable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(PROCESS_TIME_HEADER),
        ])
}
