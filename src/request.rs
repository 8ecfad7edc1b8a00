//! Incoming HTTP request type.

use bytes::Bytes;

/// An incoming HTTP request. Immutable once received.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) keep_alive: bool,
}

impl Request {
    pub(crate) fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        headers: Vec<(String, String)>,
        body: Bytes,
        keep_alive: bool,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers,
            body,
            keep_alive,
        }
    }

    /// Converts the parts hyper hands a session into a `Request`.
    ///
    /// Header values that are not visible ASCII are dropped rather than
    /// lossily decoded.
    pub(crate) fn from_parts(parts: &http::request::Parts, body: Bytes) -> Self {
        let headers = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect::<Vec<_>>();
        let keep_alive = wants_keep_alive(parts.version, &headers);
        Self::new(parts.method.as_str(), parts.uri.path(), headers, body, keep_alive)
    }

    /// The raw method token, which may lie outside [`Method`](crate::Method).
    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Whether the client asked for the connection to stay open.
    pub fn keep_alive(&self) -> bool { self.keep_alive }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn wants_keep_alive(version: http::Version, headers: &[(String, String)]) -> bool {
    let connection = headers.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("connection"))
        .map(|(_, v)| v.as_str());
    let has = |token: &str| {
        connection.is_some_and(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)))
    };
    if has("close") {
        false
    } else if has("keep-alive") {
        true
    } else {
        version >= http::Version::HTTP_11
    }
}
