//! Prefix router with a before/after middleware pipeline.
//!
//! Handlers are matched by **segment prefix** in **registration order**:
//! the first handler whose registered path is a segment-wise prefix of the
//! request path wins, however specific a later one would be. Register the
//! narrow paths first.
//!
//! ```text
//! registered "/api/users"   request "/api/users/5"   → match
//! registered "/api/use"     request "/api/users/5"   → no match (segments differ)
//! registered "/"            request anything         → match
//! ```
//!
//! A dispatch runs in five steps:
//!
//! 1. BEFORE hooks in order; the first [`Flow::Abort`] ends dispatch with `400`.
//! 2. Every AFTER-interested middleware visited on the way is recorded as owed.
//! 3. The first matching handler runs: no match → `404`, a method outside
//!    [`Method`] → `501`, a verb the handler lacks → `400`.
//! 4. Owed AFTER hooks run in the same order against whatever step 3
//!    produced; the first abort replaces the response with `417`.
//! 5. The owed list is dropped with the dispatch call.
//!
//! The owed list and each middleware's [`Scratch`] live on the dispatch
//! call's stack, never on the router, so one router serves any number of
//! concurrent dispatches.

use std::net::SocketAddr;

use tracing::debug;

use crate::handler::{self, Handler};
use crate::method::Method;
use crate::middleware::{Flow, Middleware, Scratch};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

// ── Prefix ────────────────────────────────────────────────────────────────────

/// A path split into its non-empty segments.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Prefix {
    segments: Vec<String>,
}

impl Prefix {
    pub(crate) fn new(path: &str) -> Self {
        Self { segments: segments(path).map(str::to_owned).collect() }
    }

    /// Whether every segment of `self` equals, in order, the matching
    /// segment of `path`. Extra trailing segments in `path` are ignored.
    pub(crate) fn matches(&self, path: &str) -> bool {
        let mut target = segments(path);
        self.segments.iter().all(|want| target.next() == Some(want.as_str()))
    }

    fn joined(&self, rest: &Prefix) -> Prefix {
        let mut segments = self.segments.clone();
        segments.extend(rest.segments.iter().cloned());
        Prefix { segments }
    }

    fn display(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

// ── Registrations ─────────────────────────────────────────────────────────────

struct Route {
    prefix: Prefix,
    handler: Box<dyn Handler>,
}

struct Layer {
    filter: Option<Prefix>,
    middleware: Box<dyn Middleware>,
}

impl Layer {
    fn applies_to(&self, path: &str) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter.matches(path))
    }
}

/// An AFTER call still owed for the request being dispatched.
struct Owed<'a> {
    middleware: &'a dyn Middleware,
    scratch: Scratch,
}

// ── Group ─────────────────────────────────────────────────────────────────────

/// Handlers sharing a base path, added to a [`Router`] in one go.
///
/// ```rust
/// # use quay::{handler, Group, Request, Router, Status};
/// # async fn list(_: Request) -> Status { Status::Ok }
/// # async fn login(_: Request) -> Status { Status::Ok }
/// let api = Group::new("/api")
///     .handler("/users", handler::get(list))   // served at /api/users
///     .handler("/auth",  handler::post(login)); // served at /api/auth
///
/// let router = Router::new().group(api);
/// ```
pub struct Group {
    base: Prefix,
    routes: Vec<Route>,
}

impl Group {
    pub fn new(base: &str) -> Self {
        Self { base: Prefix::new(base), routes: Vec::new() }
    }

    /// Adds `handler` at `base + path`. Returns `self` for chaining.
    pub fn handler(mut self, path: &str, handler: impl Handler) -> Self {
        self.routes.push(Route {
            prefix: self.base.joined(&Prefix::new(path)),
            handler: Box::new(handler),
        });
        self
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// It owns every handler and middleware registered on it until it is dropped
/// at shutdown.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    layers: Vec<Layer>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` under `path`. Returns `self` for chaining.
    pub fn handler(mut self, path: &str, handler: impl Handler) -> Self {
        self.routes.push(Route { prefix: Prefix::new(path), handler: Box::new(handler) });
        self
    }

    /// Appends every handler of `group`, in the group's order.
    pub fn group(mut self, group: Group) -> Self {
        self.routes.extend(group.routes);
        self
    }

    /// Appends a middleware that observes every request.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Layer { filter: None, middleware: Box::new(middleware) });
        self
    }

    /// Appends a middleware that only observes requests under `prefix`.
    pub fn layer_at(mut self, prefix: &str, middleware: impl Middleware) -> Self {
        self.layers.push(Layer {
            filter: Some(Prefix::new(prefix)),
            middleware: Box::new(middleware),
        });
        self
    }

    /// Registered handler paths, in match order.
    pub fn paths(&self) -> Vec<String> {
        self.routes.iter().map(|route| route.prefix.display()).collect()
    }

    /// Routes one request through the pipeline and produces its response.
    pub async fn dispatch(&self, req: Request, peer: SocketAddr) -> Response {
        let mut owed = Vec::new();

        for layer in self.layers.iter().filter(|layer| layer.applies_to(req.path())) {
            let phase = layer.middleware.phase();
            let mut scratch = Scratch::new();
            if phase.fires_before() && layer.middleware.before(&req, peer, &mut scratch) == Flow::Abort {
                debug!(peer = %peer, path = req.path(), "request aborted before dispatch");
                return Response::status(Status::BadRequest);
            }
            if phase.fires_after() {
                owed.push(Owed { middleware: layer.middleware.as_ref(), scratch });
            }
        }

        let route = self.routes.iter().find(|route| route.prefix.matches(req.path()));
        let response = match (route, req.method().parse::<Method>()) {
            (None, _) => Response::status(Status::NotFound),
            (Some(_), Err(e)) => {
                debug!(peer = %peer, "{e}");
                Response::status(Status::NotImplemented)
            }
            (Some(route), Ok(method)) => handler::call(route.handler.as_ref(), method, req).await,
        };

        for Owed { middleware, mut scratch } in owed {
            if middleware.after(&response, peer, &mut scratch) == Flow::Abort {
                debug!(peer = %peer, status = response.status_code(), "response aborted after dispatch");
                return Response::status(Status::ExpectationFailed);
            }
        }

        response
    }
}
