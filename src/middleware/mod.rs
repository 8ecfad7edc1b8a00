//! Middleware pipeline.
//!
//! Middleware observes requests before the handler runs and responses after
//! it returns. Each one declares its [`Phase`]; the router only consults the
//! hooks that phase names.
//!
//! A BEFORE hook may stash state for its own AFTER hook in the per-request
//! [`Scratch`] map it is handed. Every middleware gets a fresh, private map
//! for every request, so nothing leaks between concurrent requests or
//! between middlewares:
//!
//! ```rust
//! use std::net::SocketAddr;
//! use quay::middleware::{Flow, Middleware, Phase, Scratch};
//! use quay::{Request, Response};
//!
//! #[derive(Clone)]
//! struct RequestId(String);
//!
//! struct EchoCheck;
//!
//! impl Middleware for EchoCheck {
//!     fn phase(&self) -> Phase { Phase::Both }
//!
//!     fn before(&self, req: &Request, _peer: SocketAddr, scratch: &mut Scratch) -> Flow {
//!         match req.header("x-request-id") {
//!             Some(id) => { scratch.insert(RequestId(id.to_owned())); Flow::Continue }
//!             None => Flow::Abort,
//!         }
//!     }
//!
//!     fn after(&self, res: &Response, _peer: SocketAddr, scratch: &mut Scratch) -> Flow {
//!         let sent = scratch.get::<RequestId>().map(|id| id.0.as_str());
//!         if res.header("x-request-id") == sent { Flow::Continue } else { Flow::Abort }
//!     }
//! }
//! ```

use std::net::SocketAddr;

use crate::request::Request;
use crate::response::Response;

pub mod access_log;

pub use access_log::AccessLog;

/// Per-request, per-middleware state shared between its BEFORE and AFTER hooks.
pub type Scratch = http::Extensions;

/// Whether dispatch should carry on past a hook.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Abort,
}

/// Which hooks of a middleware the router consults.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Before,
    After,
    Both,
}

impl Phase {
    pub fn fires_before(self) -> bool {
        matches!(self, Self::Before | Self::Both)
    }

    pub fn fires_after(self) -> bool {
        matches!(self, Self::After | Self::Both)
    }
}

/// A hook pair wrapped around every handler call.
///
/// Hooks are synchronous and run on the I/O loop: keep them short.
pub trait Middleware: Send + Sync + 'static {
    fn phase(&self) -> Phase;

    /// Runs before the handler. [`Flow::Abort`] stops dispatch with `400`.
    fn before(&self, _req: &Request, _peer: SocketAddr, _scratch: &mut Scratch) -> Flow {
        Flow::Continue
    }

    /// Runs after the handler. [`Flow::Abort`] replaces the response with `417`.
    fn after(&self, _res: &Response, _peer: SocketAddr, _scratch: &mut Scratch) -> Flow {
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_gates() {
        assert!(Phase::Before.fires_before() && !Phase::Before.fires_after());
        assert!(!Phase::After.fires_before() && Phase::After.fires_after());
        assert!(Phase::Both.fires_before() && Phase::Both.fires_after());
    }
}
