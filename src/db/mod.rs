//! Serialized data access.
//!
//! One [`QueryWorker`] owns the only live database connection. Handlers
//! reach it through cloned [`Queries`] handles, which push onto a FIFO the
//! worker drains one statement at a time:
//!
//! ```rust,no_run
//! use quay::db::{QueryWorker, Value};
//!
//! # async fn run() -> Result<(), quay::db::DbError> {
//! let worker = QueryWorker::open("quay.db")?;
//! let queries = worker.handle();
//!
//! // Callback style: runs on the worker thread.
//! queries.enqueue("SELECT 1", Vec::new(), |result| {
//!     println!("{:?}", result.map(|rows| rows.to_json()));
//! });
//!
//! // Await style: the result is handed back through a oneshot channel.
//! let rows = queries.query("SELECT ?1 AS n", vec![Value::Integer(7)]).await?;
//! assert_eq!(rows.to_json()[0]["n"], 7);
//!
//! worker.shutdown();
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use thiserror::Error;

mod result;
mod worker;

pub use result::QueryResult;
pub use rusqlite::types::Value;
pub use worker::{Queries, QueryWorker};

/// Errors produced by the query worker.
///
/// Per-query failures are handed to that query's callback; only
/// [`QueryWorker::open`] and [`QueryWorker::spawn`] return them directly.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to open database `{}`: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to spawn query worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("query worker has stopped")]
    WorkerStopped,

    #[error("query worker dropped the query without answering")]
    WorkerDropped,
}
