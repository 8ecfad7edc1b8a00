//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Handlers build a [`Response`] and return it. The session stamps the
//! fields every response carries (`server`, `content-type`, `connection`)
//! right before the bytes go out, so handlers never set them by hand.
//! A session serves one request, so `connection` is always `close`.

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use tracing::warn;

use crate::status::Status;

/// Value of the `server` header on every response.
pub const SERVER_NAME: &str = "quay";

const JSON: &str = "application/json";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts
///
/// ```rust
/// use quay::{Response, Status};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::status(Status::NoContent);
/// Response::error(Status::BadRequest, "Missing body");
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use quay::{Response, Status};
///
/// Response::builder()
///     .status(Status::Created)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: u16,
}

impl Response {
    /// `200 OK` with a JSON body.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` with `value` serialized as the body.
    pub fn json_value(value: &serde_json::Value) -> Self {
        Self::json(value.to_string().into_bytes())
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code.into() }
    }

    /// Error response with body `{"error": "<message>"}`.
    pub fn error(code: Status, message: impl AsRef<str>) -> Self {
        let body = serde_json::json!({ "error": message.as_ref() });
        Self::builder().status(code).json(body.to_string().into_bytes())
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok.into() }
    }

    pub fn status_code(&self) -> u16 { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets `name`, replacing any existing value.
    pub(crate) fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    /// Applies the fields every response leaving a session carries.
    pub(crate) fn stamp_defaults(&mut self) {
        self.set_header("server", SERVER_NAME);
        self.set_header("content-type", JSON);
        self.set_header("connection", "close");
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = StatusCode::from_u16(self.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let headers = res.headers_mut();
        for (name, value) in self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: u16,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code.into();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body.
    pub fn json(self, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), JSON.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        Response { body: Vec::new(), headers: self.headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

/// Return a [`Status`] directly from a handler: `return Status::NotFound`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}

impl IntoResponse for serde_json::Value {
    fn into_response(self) -> Response { Response::json_value(&self) }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(ok) => ok.into_response(),
            Err(err) => err.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_is_a_json_object_with_the_message() {
        let res = Response::error(Status::BadRequest, "Missing body");
        assert_eq!(res.status_code(), 400);
        let body: serde_json::Value = serde_json::from_slice(res.body()).expect("json body");
        assert_eq!(body, serde_json::json!({ "error": "Missing body" }));
    }

    #[test]
    fn bare_status_has_no_body_or_headers() {
        let res = Response::status(Status::NotFound);
        assert_eq!(res.status_code(), 404);
        assert!(res.body().is_empty());
        assert!(res.headers().is_empty());
    }

    #[test]
    fn stamping_replaces_existing_defaults() {
        let mut res = Response::builder()
            .header("Content-Type", "text/plain")
            .header("x-trace", "1")
            .header("Connection", "keep-alive")
            .no_body();
        res.stamp_defaults();
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.header("server"), Some(SERVER_NAME));
        assert_eq!(res.header("connection"), Some("close"));
        assert_eq!(res.header("x-trace"), Some("1"));
        for name in ["content-type", "connection"] {
            let count = res.headers().iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(name))
                .count();
            assert_eq!(count, 1, "{name}");
        }
    }

    #[test]
    fn into_http_keeps_status_headers_and_drops_invalid_names() {
        let res = Response::builder()
            .status(Status::Created)
            .header("location", "/users/42")
            .header("bad header", "x")
            .json(b"{}".to_vec())
            .into_http();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()["location"], "/users/42");
        assert_eq!(res.headers()["content-type"], "application/json");
        assert_eq!(res.headers().len(), 2);
    }

    #[test]
    fn result_converts_through_either_side() {
        let ok: Result<Status, Response> = Ok(Status::NoContent);
        let err: Result<Status, Response> = Err(Response::error(Status::Forbidden, "no"));
        assert_eq!(ok.into_response().status_code(), 204);
        assert_eq!(err.into_response().status_code(), 403);
    }
}
