//! HTTP status codes as a typed enum.
//!
//! Only the codes this backend actually produces are listed. The router
//! owns four of them: `BadRequest` (BEFORE abort, or an unimplemented verb),
//! `NotFound`, `ExpectationFailed` (AFTER abort) and `NotImplemented`.
//!
//! ```rust
//! use quay::{Response, Status};
//!
//! Response::status(Status::NoContent);
//! Response::error(Status::Unauthorized, "missing token");
//! ```

/// A status code a [`Response`](crate::Response) can carry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200
    Created,             // 201
    NoContent,           // 204

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    Unauthorized,        // 401
    Forbidden,           // 403
    NotFound,            // 404
    ExpectationFailed,   // 417

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
    NotImplemented,      // 501
    ServiceUnavailable,  // 503
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                  => 200,
            Status::Created             => 201,
            Status::NoContent           => 204,
            Status::BadRequest          => 400,
            Status::Unauthorized        => 401,
            Status::Forbidden           => 403,
            Status::NotFound            => 404,
            Status::ExpectationFailed   => 417,
            Status::InternalServerError => 500,
            Status::NotImplemented      => 501,
            Status::ServiceUnavailable  => 503,
        }
    }
}
