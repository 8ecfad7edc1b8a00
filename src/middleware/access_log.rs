//! Combined-style access log.
//!
//! Captures the user agent before dispatch and, once the response exists,
//! emits one line per request on the `access` tracing target:
//!
//! ```text
//! 203.0.113.7 - [19/Oct/2026:14:03:51 +0000] "200" 27 - "curl/8.5.0"
//! ```

use std::net::SocketAddr;

use chrono::{DateTime, Local, TimeZone};
use tracing::info;

use super::{Flow, Middleware, Phase, Scratch};
use crate::request::Request;
use crate::response::Response;

#[derive(Clone)]
struct UserAgent(String);

/// Logs peer, time, status, body size and user agent for every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessLog;

impl AccessLog {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for AccessLog {
    fn phase(&self) -> Phase {
        Phase::Both
    }

    fn before(&self, req: &Request, _peer: SocketAddr, scratch: &mut Scratch) -> Flow {
        let agent = req.header("user-agent").unwrap_or_default();
        scratch.insert(UserAgent(agent.to_owned()));
        Flow::Continue
    }

    fn after(&self, res: &Response, peer: SocketAddr, scratch: &mut Scratch) -> Flow {
        let agent = scratch.get::<UserAgent>().map_or("", |ua| ua.0.as_str());
        let line = format_line(peer, &Local::now(), res.status_code(), res.body().len(), agent);
        info!(target: "access", "{line}");
        Flow::Continue
    }
}

pub(crate) fn format_line<Tz>(
    peer: SocketAddr,
    at: &DateTime<Tz>,
    status: u16,
    size: usize,
    user_agent: &str,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} - [{}] \"{status}\" {size} - \"{user_agent}\"",
        peer.ip(),
        at.format("%d/%b/%Y:%H:%M:%S %z"),
    )
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use chrono::{FixedOffset, Utc};

    use super::*;
    use crate::status::Status;

    fn peer() -> SocketAddr {
        "203.0.113.7:51234".parse().expect("valid addr")
    }

    #[test]
    fn line_carries_peer_time_status_size_and_agent() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 14, 3, 51).single().expect("valid time");
        let line = format_line(peer(), &at, 200, 27, "curl/8.5.0");
        assert_eq!(line, r#"203.0.113.7 - [19/Oct/2026:14:03:51 +0000] "200" 27 - "curl/8.5.0""#);
    }

    #[test]
    fn offset_is_rendered_from_the_timezone() {
        let tz = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        let at = tz.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid time");
        let line = format_line(peer(), &at, 404, 0, "");
        assert!(line.contains("[02/Jan/2026:03:04:05 +0200]"), "{line}");
    }

    #[test]
    fn before_captures_user_agent_for_after() {
        let req = Request::new(
            "GET",
            "/",
            vec![("User-Agent".to_owned(), "probe/1".to_owned())],
            Bytes::new(),
            true,
        );
        let mut scratch = Scratch::new();
        assert_eq!(AccessLog.before(&req, peer(), &mut scratch), Flow::Continue);
        assert_eq!(scratch.get::<UserAgent>().map(|ua| ua.0.as_str()), Some("probe/1"));
        let res = Response::status(Status::Ok);
        assert_eq!(AccessLog.after(&res, peer(), &mut scratch), Flow::Continue);
    }
}
