//! Request routing.
//!
//! `GET /` serves a PNG challenge; `GET /?base64=true` serves the same
//! challenge as JSON with the image base64 encoded. Anything else is 404.

use crate::captcha::encode::encode_png;
use crate::captcha::{Challenge, ChallengeGenerator, ChallengeImage, Encoding};
use crate::service::response::{self, ChallengeBody, HttpResponse};
use hyper::Request;
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use tracing::{error, info};

/// Parses a boolean the way Go's `strconv.ParseBool` does.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn decode_component(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Reads the first `key` parameter of `query` as a boolean, false if absent or invalid.
///
/// Keys and values are form-decoded before comparison.
fn query_flag(query: Option<&str>, key: &str) -> bool {
    query
        .into_iter()
        .flat_map(|q| q.split('&'))
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(name, _)| decode_component(name) == key)
        .and_then(|(_, value)| parse_bool(&decode_component(value)))
        .unwrap_or(false)
}

/// Handles one HTTP request.
pub async fn handle<B>(req: Request<B>, generator: Arc<ChallengeGenerator>) -> HttpResponse {
    if req.uri().path() != "/" {
        return response::not_found();
    }

    let encoding = Encoding::from_flag(query_flag(req.uri().query(), "base64"));
    match tokio::task::spawn_blocking(move || generator.generate(encoding)).await {
        Ok(Ok(challenge)) => render(challenge),
        Ok(Err(e)) => {
            error!(error = %e, "Challenge generation failed");
            response::internal_error()
        }
        Err(e) => {
            error!(error = %e, "Challenge task panicked");
            response::internal_error()
        }
    }
}

fn render(challenge: Challenge) -> HttpResponse {
    info!(text = %challenge.text, "Challenge served");
    match challenge.image {
        ChallengeImage::Base64(base64) => response::json(&ChallengeBody {
            text: &challenge.text,
            base64: &base64,
        }),
        ChallengeImage::Raw(image) => match encode_png(&image) {
            Ok(png) => response::png(png, &challenge.text),
            Err(e) => {
                error!(error = %e, "Unable to encode image");
                response::internal_error()
            }
        },
    }
}
