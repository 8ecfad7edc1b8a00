use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use rusqlite::types::Value;
use rusqlite::{Connection, Statement};
use tokio::sync::oneshot;
use tracing::{debug, error};

use super::{DbError, QueryResult};

type Callback = Box<dyn FnOnce(Result<QueryResult, DbError>) + Send + 'static>;

/// A submitted statement waiting for the worker.
///
/// The callback fires exactly once: with the outcome, or with
/// [`DbError::WorkerStopped`] if the query is dropped unanswered (sent after
/// the worker stopped, or still queued when it did).
struct Query {
    statement: String,
    params: Vec<Value>,
    callback: Option<Callback>,
}

impl Query {
    fn complete(mut self, result: Result<QueryResult, DbError>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl Drop for Query {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(Err(DbError::WorkerStopped));
        }
    }
}

enum Command {
    Run(Query),
    Stop,
}

// ── Queries ───────────────────────────────────────────────────────────────────

/// Producer handle onto the worker's queue. Cheap to clone, safe to share.
#[derive(Clone)]
pub struct Queries {
    sender: Sender<Command>,
}

impl Queries {
    /// Appends a statement to the queue.
    ///
    /// `callback` normally runs on the worker thread once the statement has
    /// executed. If the worker has already stopped, it runs right here on
    /// the caller's thread with [`DbError::WorkerStopped`] before `enqueue`
    /// returns, so it must not take a lock the caller is holding.
    ///
    /// Empty `params` run the statement as-is; otherwise it is prepared and
    /// the values are bound positionally (`?1`, `?2`, …).
    pub fn enqueue<F>(&self, statement: impl Into<String>, params: Vec<Value>, callback: F)
    where
        F: FnOnce(Result<QueryResult, DbError>) + Send + 'static,
    {
        let query = Query {
            statement: statement.into(),
            params,
            callback: Some(Box::new(callback)),
        };
        // A failed send hands the query back inside the error; dropping it
        // answers the callback with `WorkerStopped`.
        if self.sender.send(Command::Run(query)).is_err() {
            debug!("query submitted after the worker stopped");
        }
    }

    /// Enqueues a statement and waits for its result without blocking the
    /// calling task's thread.
    pub async fn query(
        &self,
        statement: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<QueryResult, DbError> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(statement, params, move |result| {
            let _ = tx.send(result);
        });
        rx.await.map_err(|_| DbError::WorkerDropped)?
    }
}

// ── QueryWorker ───────────────────────────────────────────────────────────────

/// Owner of the single database connection and the thread that uses it.
///
/// Statements run strictly in submission order, one at a time. Call
/// [`shutdown`](QueryWorker::shutdown) to drain the queue and close the
/// connection; dropping the worker stops it without waiting.
pub struct QueryWorker {
    sender: Sender<Command>,
    thread: Option<JoinHandle<()>>,
}

impl QueryWorker {
    /// Opens the SQLite database at `path` and starts the worker on it.
    ///
    /// # Errors
    /// Returns [`DbError::Open`] if the database cannot be opened, or
    /// [`DbError::Spawn`] if the worker thread cannot be started.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|source| DbError::Open { path: path.to_path_buf(), source })?;
        Self::spawn(conn)
    }

    /// Starts a worker on a private in-memory database.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::spawn(Connection::open_in_memory()?)
    }

    /// Moves `conn` onto a dedicated thread and starts draining the queue.
    pub fn spawn(conn: Connection) -> Result<Self, DbError> {
        let (sender, receiver) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("query-worker".to_owned())
            .spawn(move || run(conn, receiver))
            .map_err(DbError::Spawn)?;
        Ok(Self { sender, thread: Some(thread) })
    }

    /// A new producer handle onto this worker's queue.
    pub fn handle(&self) -> Queries {
        Queries { sender: self.sender.clone() }
    }

    /// Stops the worker after everything queued so far has run, then waits
    /// for it to close the connection.
    pub fn shutdown(mut self) {
        let _ = self.sender.send(Command::Stop);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("query worker panicked");
            }
        }
    }
}

impl Drop for QueryWorker {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.sender.send(Command::Stop);
        }
    }
}

fn run(conn: Connection, receiver: Receiver<Command>) {
    debug!("query worker started");
    while let Ok(command) = receiver.recv() {
        let query = match command {
            Command::Run(query) => query,
            Command::Stop => break,
        };
        let result = execute(&conn, &query.statement, &query.params);
        if let Err(e) = &result {
            debug!(statement = %query.statement, "query failed: {e}");
        }
        answer(query, result);
    }
    while let Ok(command) = receiver.try_recv() {
        if let Command::Run(query) = command {
            answer(query, Err(DbError::WorkerStopped));
        }
    }
    // Queries sent after the drain are answered as the channel drops them.
    if panic::catch_unwind(AssertUnwindSafe(move || drop(receiver))).is_err() {
        error!("query callback panicked");
    }
    if let Err((_, e)) = conn.close() {
        error!("failed to close database connection: {e}");
    }
    debug!("query worker stopped");
}

/// Fires the callback; a panic in it must not take the connection down.
fn answer(query: Query, result: Result<QueryResult, DbError>) {
    if panic::catch_unwind(AssertUnwindSafe(|| query.complete(result))).is_err() {
        error!("query callback panicked");
    }
}

fn execute(conn: &Connection, statement: &str, params: &[Value]) -> Result<QueryResult, DbError> {
    if params.is_empty() {
        let mut stmt = conn.prepare(statement)?;
        collect(&mut stmt, params)
    } else {
        let mut stmt = conn.prepare_cached(statement)?;
        collect(&mut stmt, params)
    }
}

fn collect(stmt: &mut Statement<'_>, params: &[Value]) -> Result<QueryResult, DbError> {
    let params = rusqlite::params_from_iter(params.iter());
    if stmt.column_count() == 0 {
        let rows_affected = stmt.execute(params)?;
        return Ok(QueryResult { rows_affected, ..QueryResult::default() });
    }

    let columns = stmt.column_names().into_iter().map(str::to_owned).collect::<Vec<_>>();
    let width = columns.len();
    let mut rows = Vec::new();
    let mut cursor = stmt.query(params)?;
    while let Some(row) = cursor.next()? {
        let values = (0..width)
            .map(|i| row.get::<_, Value>(i))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }
    Ok(QueryResult { columns, rows, rows_affected: 0 })
}
