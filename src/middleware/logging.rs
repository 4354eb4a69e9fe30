use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::app::AppState;

const REDACTED: &str = "*****";

/// Logs every request with both bodies, masking password values.
///
/// Level follows the response status: `error` for 5xx, `warn` for 4xx, `info` otherwise.
pub async fn http_logger(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limit = state.config.api.max_request_size_bytes;
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let authorized = request.headers().contains_key("authorization");

    let (parts, body) = request.into_parts();
    let request_body = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
    };
    let request_log = sanitize(&request_body);

    let response = next
        .run(Request::from_parts(parts, Body::from(request_body)))
        .await;

    let status = response.status();
    let (parts, body) = response.into_parts();
    let response_body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("Failed to buffer response body for {} {}: {}", method, path, err);
            Bytes::new()
        }
    };
    let response_log = sanitize(&response_body);

    let status_code = status.as_u16();
    if status.is_server_error() {
        error!(target: "http", %method, %path, status = status_code, authorized, req_body = %request_log, res_body = %response_log, "request");
    } else if status.is_client_error() {
        warn!(target: "http", %method, %path, status = status_code, authorized, req_body = %request_log, res_body = %response_log, "request");
    } else {
        info!(target: "http", %method, %path, status = status_code, authorized, req_body = %request_log, res_body = %response_log, "request");
    }

    Response::from_parts(parts, Body::from(response_body))
}

/// Renders a body for logging with every `password` value replaced.
pub fn sanitize(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(mut value) => {
            redact_passwords(&mut value);
            value.to_string()
        }
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

fn redact_passwords(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if key.eq_ignore_ascii_case("password") {
                    *field = Value::String(REDACTED.to_string());
                } else {
                    redact_passwords(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_passwords),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn passwords_are_masked_at_any_depth() {
        let body = json!({
            "email": "a@x.com",
            "password": "pw123",
            "nested": { "Password": "secret", "keep": 1 },
            "list": [{ "password": "other" }]
        });
        let logged: Value = serde_json::from_str(&sanitize(body.to_string().as_bytes())).unwrap();

        assert_eq!(logged["password"], "*****");
        assert_eq!(logged["nested"]["Password"], "*****");
        assert_eq!(logged["nested"]["keep"], 1);
        assert_eq!(logged["list"][0]["password"], "*****");
        assert_eq!(logged["email"], "a@x.com");
    }

    #[test]
    fn non_json_bodies_pass_through() {
        assert_eq!(sanitize(b""), "");
        assert_eq!(sanitize(b"plain text"), "plain text");
    }
}
