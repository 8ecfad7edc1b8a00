//! The handlers the `quay` binary serves, and the router that wires them.

pub mod health;
mod root;

pub use root::Root;

use crate::db::Queries;
use crate::middleware::AccessLog;
use crate::{Group, Router, handler};

/// Builds the application router.
///
/// | Path | Handler |
/// |---|---|
/// | `/healthz` | [`health::liveness`] |
/// | `/readyz` | [`health::Readiness`] |
/// | `/api` | [`Root`] |
///
/// Every request passes through [`AccessLog`].
pub fn app(queries: Queries) -> Router {
    Router::new()
        .handler("/healthz", handler::get(health::liveness))
        .handler("/readyz", health::Readiness::new(queries))
        .group(Group::new("/api").handler("/", Root))
        .layer(AccessLog::new())
}
