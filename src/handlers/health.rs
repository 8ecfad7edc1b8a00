//! Health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can it reach the database? |
//!
//! Readiness round-trips `SELECT 1` through the query worker, so a stalled
//! or stopped worker shows up here before it shows up in real traffic.

use serde_json::json;

use crate::db::Queries;
use crate::handler::{BoxFuture, Handler};
use crate::{Request, Response, Status};

/// Liveness probe. Always `200 {"status": "ok"}`: if the process can answer
/// HTTP at all, it is alive.
pub async fn liveness(_req: Request) -> Response {
    Response::json_value(&json!({ "status": "ok" }))
}

/// Readiness probe gated on the query worker.
pub struct Readiness {
    queries: Queries,
}

impl Readiness {
    pub fn new(queries: Queries) -> Self {
        Self { queries }
    }
}

impl Handler for Readiness {
    fn get(&self, _req: Request) -> BoxFuture {
        let queries = self.queries.clone();
        Box::pin(async move {
            match queries.query("SELECT 1", Vec::new()).await {
                Ok(_) => Response::json_value(&json!({ "status": "ready" })),
                Err(e) => Response::error(Status::ServiceUnavailable, e.to_string()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::db::QueryWorker;

    fn get() -> Request {
        Request::new("GET", "/readyz", Vec::new(), Bytes::new(), true)
    }

    #[tokio::test]
    async fn readiness_follows_the_worker() {
        let worker = QueryWorker::open_in_memory().expect("in-memory database");
        let probe = Readiness::new(worker.handle());

        let res = probe.get(get()).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), br#"{"status":"ready"}"#);

        worker.shutdown();
        let res = probe.get(get()).await;
        assert_eq!(res.status_code(), 503);
        assert_eq!(res.body(), br#"{"error":"query worker has stopped"}"#);
    }
}
