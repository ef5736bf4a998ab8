//! HTTP utilities for request/response handling and CORS

use lambda_http::http::HeaderValue;
use lambda_http::{Body, Response};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::NotifyError;

/// CORS headers attached to every response; the origin is replaced per deployment
pub fn get_cors_headers() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Headers", "x-requested-with"),
        ("Access-Control-Allow-Credentials", "true"),
    ]
}

fn build_response(status: u16, body: Body) -> Response<Body> {
    let mut response = Response::builder().status(status);
    for (key, value) in get_cors_headers() {
        response = response.header(key, value);
    }
    response
        .header("Content-Type", "application/json")
        .body(body)
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(Body::Empty);
            *fallback.status_mut() = lambda_http::http::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

/// Build an error response with consistent formatting
pub fn error_response(
    status: u16,
    error: &str,
    details: &str,
    suggestion: Option<&str>,
) -> Response<Body> {
    let mut body = json!({
        "error": error,
        "details": details,
    });

    if let Some(suggestion) = suggestion {
        body["suggestion"] = json!(suggestion);
    }

    build_response(status, body.to_string().into())
}

/// Build a successful response with CORS headers
pub fn success_response(status: u16, body: &Value) -> Response<Body> {
    build_response(status, body.to_string().into())
}

/// Swap the wildcard origin for the configured one
pub fn with_cors_origin(mut response: Response<Body>, origin: &str) -> Response<Body> {
    if let Ok(value) = HeaderValue::from_str(origin) {
        response
            .headers_mut()
            .insert("Access-Control-Allow-Origin", value);
    }
    response
}

pub fn generate_short_id(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn parse_json_body(body: &Body) -> Result<Value, NotifyError> {
    let body_str = match body {
        Body::Empty => "{}",
        Body::Text(s) => s,
        Body::Binary(b) => std::str::from_utf8(b).map_err(|_| {
            NotifyError::InvalidRequest("Could not parse request body as UTF-8".to_string())
        })?,
        _ => "{}",
    };

    serde_json::from_str(body_str)
        .map_err(|_| NotifyError::InvalidRequest("Could not parse request body as JSON".to_string()))
}

pub fn get_value_in_json<T>(body: &Value, key: &str) -> Result<T, NotifyError>
where
    T: DeserializeOwned,
{
    match body.get(key) {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|_| NotifyError::InvalidRequest(format!("{} is not a valid value", key))),
        None => Err(NotifyError::InvalidRequest(format!("{} is required", key))),
    }
}
