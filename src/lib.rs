//! # quay
//!
//! The request-dispatch and data-access core of a small JSON backend.
//!
//! - **Listener / sessions**: tokio accept loop, one session per
//!   connection, one request per session, write half shut down after the
//!   response is flushed.
//! - **Router**: handlers matched by segment prefix, first registration
//!   wins; a BEFORE/AFTER middleware pipeline wrapped around every call.
//! - **Query worker**: one database connection on one dedicated thread,
//!   fed by a FIFO that any handler can push onto without blocking the I/O
//!   loop.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use quay::db::QueryWorker;
//! use quay::middleware::AccessLog;
//! use quay::{handler, Group, Request, Response, Router, Server, Status};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), quay::Error> {
//!     let worker = QueryWorker::open("quay.db")?;
//!     let queries = worker.handle();
//!
//!     let users = handler::get(move |_req: Request| {
//!         let queries = queries.clone();
//!         async move {
//!             match queries.query("SELECT id, name FROM users", Vec::new()).await {
//!                 Ok(rows) => Response::json_value(&rows.to_json()),
//!                 Err(e) => Response::error(Status::InternalServerError, e.to_string()),
//!             }
//!         }
//!     });
//!
//!     let app = Router::new()
//!         .group(Group::new("/api").handler("/users", users))
//!         .layer(AccessLog::new());
//!
//!     Server::bind("0.0.0.0:8080").await?.serve(app).await;
//!     worker.shutdown();
//!     Ok(())
//! }
//! ```

mod error;
mod method;
mod request;
mod response;
mod router;
mod server;
mod session;
mod status;

pub mod config;
pub mod db;
pub mod handler;
pub mod handlers;
pub mod middleware;

pub use error::Error;
pub use handler::{BoxFuture, Handler, Verbs};
pub use method::{Method, UnsupportedMethod};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::{Group, Router};
pub use server::Server;
pub use status::Status;
