//! Request id and process-time middleware.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuse the caller's `X-Request-Id` when it is sane, otherwise mint a UUID v4.
/// The id is written to the request (for the trace span) and echoed on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let incoming = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN && v.to_str().is_ok())
        .cloned();
    let value = match incoming {
        Some(v) => v,
        None => match HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            Ok(v) => v,
            Err(_) => return next.run(req).await,
        },
    };
    req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, value);
    response
}

/// Adds `X-Process-Time`: seconds spent producing the response.
pub async fn process_time(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    if let Ok(value) = HeaderValue::from_str(&format!("{:.6}", elapsed.as_secs_f64())) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    response
}
