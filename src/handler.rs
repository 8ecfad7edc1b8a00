//! Handler capability trait and per-verb operation sets.
//!
//! A [`Handler`] exposes one operation per [`Method`]. Every operation
//! defaults to [`reject`] (`400 Bad Request`), so an implementation only
//! overrides the verbs it actually serves:
//!
//! ```rust
//! use quay::{BoxFuture, Handler, Request, Response};
//!
//! struct Hello;
//!
//! impl Handler for Hello {
//!     fn get(&self, _req: Request) -> BoxFuture {
//!         Box::pin(async { Response::json(br#"{"message":"hi"}"#.to_vec()) })
//!     }
//! }
//! ```
//!
//! Most handlers are easier to write as plain `async fn`s collected into a
//! [`Verbs`] set:
//!
//! ```rust
//! use quay::{handler, Request, Response, Status};
//!
//! async fn show(_req: Request) -> Response { Response::json(b"{}".to_vec()) }
//! async fn remove(_req: Request) -> Status { Status::NoContent }
//!
//! let users = handler::get(show).delete(remove);
//! ```
//!
//! # How async operations are stored
//!
//! The set holds operations of *different* concrete types in one array, so
//! each is erased behind `dyn ErasedOp`:
//!
//! ```text
//! async fn show(req: Request) -> Response { … }    ← user writes this
//!        ↓ Verbs::get(show)
//! show.into_boxed_op()                             ← Operation blanket impl
//!        ↓  stored as BoxedOp = Box<dyn ErasedOp>
//! op.call(req)  at request time                    ← one vtable dispatch
//!        ↓
//! Box::pin(async { show(req).await.into_response() })  ← BoxFuture
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` let tokio move the future across worker threads, so an
/// operation must own everything it touches after it returns.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

// ── Handler ───────────────────────────────────────────────────────────────────

/// A capability set with one operation per verb.
///
/// Registered once on a [`Router`](crate::Router) under a path prefix; the
/// router owns it from then on.
pub trait Handler: Send + Sync + 'static {
    fn delete(&self, req: Request) -> BoxFuture { reject(req) }
    fn get(&self, req: Request) -> BoxFuture { reject(req) }
    fn head(&self, req: Request) -> BoxFuture { reject(req) }
    fn post(&self, req: Request) -> BoxFuture { reject(req) }
    fn put(&self, req: Request) -> BoxFuture { reject(req) }
    fn options(&self, req: Request) -> BoxFuture { reject(req) }
    fn patch(&self, req: Request) -> BoxFuture { reject(req) }
}

/// The default for every verb a handler does not implement.
pub fn reject(_req: Request) -> BoxFuture {
    Box::pin(async { Response::status(Status::BadRequest) })
}

/// Routes `req` to the operation `handler` exposes for `method`.
pub(crate) fn call(handler: &dyn Handler, method: Method, req: Request) -> BoxFuture {
    match method {
        Method::Delete  => handler.delete(req),
        Method::Get     => handler.get(req),
        Method::Head    => handler.head(req),
        Method::Post    => handler.post(req),
        Method::Put     => handler.put(req),
        Method::Options => handler.options(req),
        Method::Patch   => handler.patch(req),
    }
}

// ── Operation ─────────────────────────────────────────────────────────────────

/// Implemented for every `async fn(Request) -> impl IntoResponse`.
///
/// Sealed: only the blanket impl below satisfies it.
pub trait Operation: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_op(self) -> BoxedOp;
}

mod private {
    pub trait Sealed {}
}

#[doc(hidden)]
pub trait ErasedOp: Send + Sync {
    fn call(&self, req: Request) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedOp = Box<dyn ErasedOp + 'static>;

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Operation for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_op(self) -> BoxedOp {
        Box::new(FnOp(self))
    }
}

struct FnOp<F>(F);

impl<F, Fut, R> ErasedOp for FnOp<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── Verbs ─────────────────────────────────────────────────────────────────────

/// A [`Handler`] assembled from individual async operations.
///
/// Verbs without an operation fall back to [`reject`]. Registering the same
/// verb twice keeps the last operation.
#[derive(Default)]
pub struct Verbs {
    ops: [Option<BoxedOp>; 7],
}

impl Verbs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the operation for `method`. Returns `self` for chaining.
    pub fn on(mut self, method: Method, op: impl Operation) -> Self {
        self.ops[method.index()] = Some(op.into_boxed_op());
        self
    }

    pub fn delete(self, op: impl Operation) -> Self { self.on(Method::Delete, op) }
    pub fn get(self, op: impl Operation) -> Self { self.on(Method::Get, op) }
    pub fn head(self, op: impl Operation) -> Self { self.on(Method::Head, op) }
    pub fn post(self, op: impl Operation) -> Self { self.on(Method::Post, op) }
    pub fn put(self, op: impl Operation) -> Self { self.on(Method::Put, op) }
    pub fn options(self, op: impl Operation) -> Self { self.on(Method::Options, op) }
    pub fn patch(self, op: impl Operation) -> Self { self.on(Method::Patch, op) }

    fn run(&self, method: Method, req: Request) -> BoxFuture {
        match &self.ops[method.index()] {
            Some(op) => op.call(req),
            None => reject(req),
        }
    }
}

impl Handler for Verbs {
    fn delete(&self, req: Request) -> BoxFuture { self.run(Method::Delete, req) }
    fn get(&self, req: Request) -> BoxFuture { self.run(Method::Get, req) }
    fn head(&self, req: Request) -> BoxFuture { self.run(Method::Head, req) }
    fn post(&self, req: Request) -> BoxFuture { self.run(Method::Post, req) }
    fn put(&self, req: Request) -> BoxFuture { self.run(Method::Put, req) }
    fn options(&self, req: Request) -> BoxFuture { self.run(Method::Options, req) }
    fn patch(&self, req: Request) -> BoxFuture { self.run(Method::Patch, req) }
}

/// Starts a [`Verbs`] set serving `GET` with `op`.
pub fn get(op: impl Operation) -> Verbs { Verbs::new().get(op) }

/// Starts a [`Verbs`] set serving `POST` with `op`.
pub fn post(op: impl Operation) -> Verbs { Verbs::new().post(op) }

/// Starts a [`Verbs`] set serving `PUT` with `op`.
pub fn put(op: impl Operation) -> Verbs { Verbs::new().put(op) }

/// Starts a [`Verbs`] set serving `DELETE` with `op`.
pub fn delete(op: impl Operation) -> Verbs { Verbs::new().delete(op) }

/// Starts a [`Verbs`] set serving `PATCH` with `op`.
pub fn patch(op: impl Operation) -> Verbs { Verbs::new().patch(op) }

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn request(method: &str) -> Request {
        Request::new(method, "/", Vec::new(), Bytes::new(), true)
    }

    async fn created(_req: Request) -> Status {
        Status::Created
    }

    #[tokio::test]
    async fn unimplemented_verbs_reject_with_bad_request() {
        struct Empty;
        impl Handler for Empty {}

        for method in Method::ALL {
            let res = call(&Empty, method, request(method.as_str())).await;
            assert_eq!(res.status_code(), 400, "{method}");
        }
    }

    #[tokio::test]
    async fn verbs_runs_only_registered_operations() {
        let verbs = post(created).put(|_req: Request| async { Status::NoContent });

        assert_eq!(call(&verbs, Method::Post, request("POST")).await.status_code(), 201);
        assert_eq!(call(&verbs, Method::Put, request("PUT")).await.status_code(), 204);
        assert_eq!(call(&verbs, Method::Get, request("GET")).await.status_code(), 400);
    }

    #[tokio::test]
    async fn later_registration_for_a_verb_wins() {
        let verbs = get(created).get(|_req: Request| async { Status::Ok });
        assert_eq!(call(&verbs, Method::Get, request("GET")).await.status_code(), 200);
    }
}
