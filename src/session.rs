//! One accepted connection, one request.
//!
//! A session reads a single request, routes it, writes the response and
//! then shuts down the write half of the socket:
//!
//! ```text
//! Idle → Reading → Routing → Writing → HalfClosed
//! ```
//!
//! Reading and writing are hyper's HTTP/1 codec with keep-alive disabled,
//! which is what closes the connection after the first exchange. The
//! response says so with `connection: close`, whatever the client asked
//! for; hyper would otherwise append `close` to a `keep-alive` value. A
//! transport error at any point drops the connection without a response.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::request::Request;
use crate::router::Router;

pub(crate) struct Session {
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<Router>,
}

impl Session {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr, router: Arc<Router>) -> Self {
        Self { stream, peer, router }
    }

    pub(crate) async fn run(self) {
        let Self { stream, peer, router } = self;

        // Called once per request; with keep-alive off that is once.
        let svc = service_fn(move |req| {
            let router = Arc::clone(&router);
            async move { respond(&router, req, peer).await }
        });

        let conn = http1::Builder::new()
            .keep_alive(false)
            .timer(TokioTimer::new())
            .serve_connection(TokioIo::new(stream), svc);

        match conn.await {
            Ok(()) => trace!(peer = %peer, "session closed"),
            Err(e) => debug!(peer = %peer, "session dropped: {e}"),
        }
    }
}

/// Collects the body, dispatches, and stamps the default response fields.
///
/// A body that fails mid-read is a transport error: it is returned to hyper,
/// which drops the connection without answering.
async fn respond(
    router: &Router,
    req: hyper::Request<Incoming>,
    peer: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, hyper::Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();
    let req = Request::from_parts(&parts, body);

    trace!(
        peer = %peer,
        method = req.method(),
        path = req.path(),
        keep_alive = req.keep_alive(),
        "routing"
    );
    let mut res = router.dispatch(req, peer).await;
    res.stamp_defaults();
    Ok(res.into_http())
}
