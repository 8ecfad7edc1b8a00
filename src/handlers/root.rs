use serde_json::json;

use crate::handler::{BoxFuture, Handler};
use crate::{Request, Response};

/// Hello-world handler.
pub struct Root;

impl Handler for Root {
    fn get(&self, _req: Request) -> BoxFuture {
        Box::pin(async { Response::json_value(&json!({ "message": "Hello, World!" })) })
    }
}
