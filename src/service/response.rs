//! HTTP response utilities.
//!
//! Builds the bodies and headers shared by every challenge response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, EXPIRES, PRAGMA};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::error;

pub type HttpResponse = Response<Full<Bytes>>;

/// Header carrying the plaintext answer of a PNG challenge.
pub const TEXT_HEADER: &str = "X-captcha-text";

/// JSON body of a base64 challenge.
#[derive(Debug, Serialize)]
pub struct ChallengeBody<'a> {
    pub text: &'a str,
    pub base64: &'a str,
}

fn build(
    status: StatusCode,
    content_type: &str,
    body: Vec<u8>,
    extra: &[(&str, &str)],
) -> HttpResponse {
    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, body.len())
        .header(CACHE_CONTROL, "no-store, no-cache, must-revalidate, max-age=0")
        .header(PRAGMA, "no-cache")
        .header(EXPIRES, "0");
    for (name, value) in extra {
        builder = builder.header(*name, *value);
    }

    builder.body(Full::new(Bytes::from(body))).unwrap_or_else(|e| {
        error!(error = %e, "Failed to build response");
        let mut fallback = Response::new(Full::new(Bytes::new()));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

/// Serves a PNG challenge with its answer in [`TEXT_HEADER`].
#[must_use]
pub fn png(png: Vec<u8>, text: &str) -> HttpResponse {
    build(StatusCode::OK, "image/png", png, &[(TEXT_HEADER, text)])
}

/// Serves a base64 challenge as JSON.
#[must_use]
pub fn json(body: &ChallengeBody<'_>) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => build(StatusCode::OK, "application/json", bytes, &[]),
        Err(e) => {
            error!(error = %e, "Failed to serialize challenge");
            internal_error()
        }
    }
}

#[must_use]
pub fn not_found() -> HttpResponse {
    build(
        StatusCode::NOT_FOUND,
        "text/plain; charset=utf-8",
        b"Not Found\n".to_vec(),
        &[],
    )
}

#[must_use]
pub fn internal_error() -> HttpResponse {
    build(
        StatusCode::INTERNAL_SERVER_ERROR,
        "text/plain; charset=utf-8",
        b"Internal Server Error\n".to_vec(),
        &[],
    )
}
