//! Keep-alive state derived from a response.
//!
//! A response decides whether the connection that carried it may be used for
//! another request. The signals, in order of precedence:
//!
//! 1. The client sent `Connection: close` (the caller did not want keep-alive).
//! 2. The server sent `Connection: close`.
//! 3. An HTTP/1.0 response without `Connection: keep-alive`.
//! 4. A response body delimited by the server closing the connection.
//! 5. A `101 Switching Protocols` response. The connection no longer speaks
//!    HTTP/1.1.
//! 6. A `Keep-Alive: timeout=<seconds>, max=<count>` header. A malformed header
//!    means the connection is not reused.
//!
//! The `max` parameter is the number of requests the server permits *after*
//! the one just answered. A response without `max` keeps the budget the
//! connection already had, which is unbounded for a fresh connection.

use std::time::Duration;

use http::{HeaderMap, Response, StatusCode, Version};
use smallvec::SmallVec;

use crate::ext::HeaderIterExt;
use crate::util::compare_lowercase_ascii;

/// Reasons a connection must be closed rather than reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// HTTP/1.0 without `Connection: keep-alive`.
    Http10,

    /// Client sent `Connection: close`.
    ClientConnectionClose,

    /// Server sent `Connection: close`.
    ServerConnectionClose,

    /// The response body ends when the server closes the connection.
    CloseDelimitedBody,

    /// The `Keep-Alive` header could not be understood.
    MalformedKeepAlive,

    /// The server switched the connection to another protocol.
    Upgraded,

    /// The connection was closed through [`Response::close()`][crate::Response::close]
    /// or [`Session::close()`][crate::Session::close].
    Explicit,
}

impl CloseReason {
    pub fn explain(&self) -> &'static str {
        match self {
            CloseReason::Http10 => "version is http1.0",
            CloseReason::ClientConnectionClose => "client sent Connection: close",
            CloseReason::ServerConnectionClose => "server sent Connection: close",
            CloseReason::CloseDelimitedBody => "response body is close delimited",
            CloseReason::MalformedKeepAlive => "malformed Keep-Alive header",
            CloseReason::Upgraded => "server switched protocols",
            CloseReason::Explicit => "connection closed by caller",
        }
    }
}

/// How many more requests a connection may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// The server placed no limit.
    Unbounded,
    /// Number of further requests permitted.
    Remaining(u32),
}

impl Budget {
    pub fn allows_reuse(&self) -> bool {
        !matches!(self, Budget::Remaining(0))
    }

    /// Account for one more request sent on the connection.
    pub(crate) fn consume(&mut self) {
        if let Budget::Remaining(n) = self {
            *n = n.saturating_sub(1);
        }
    }
}

/// Keep-alive state of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAlive {
    /// The connection may stay open, within the budget.
    Open {
        budget: Budget,
        /// Advisory idle timeout from `Keep-Alive: timeout=`. Not enforced here.
        timeout: Option<Duration>,
    },
    /// The connection must not be reused.
    Closed(CloseReason),
}

impl KeepAlive {
    /// Derive the state for a response.
    ///
    /// `want_keep_alive` is the caller's intent on the request, `carried` the
    /// budget the connection had after being bound to the request.
    pub(crate) fn for_response<B>(
        want_keep_alive: bool,
        response: &Response<B>,
        close_delimited: bool,
        carried: Budget,
    ) -> KeepAlive {
        let headers = response.headers();

        let mut close_reason: SmallVec<[CloseReason; 4]> = SmallVec::new();

        if !want_keep_alive {
            close_reason.push(CloseReason::ClientConnectionClose);
        }

        if headers.iter().has_connection_close() {
            close_reason.push(CloseReason::ServerConnectionClose);
        }

        if response.version() == Version::HTTP_10 && !headers.iter().has_connection_keep_alive() {
            close_reason.push(CloseReason::Http10);
        }

        if close_delimited {
            close_reason.push(CloseReason::CloseDelimitedBody);
        }

        if response.status() == StatusCode::SWITCHING_PROTOCOLS {
            close_reason.push(CloseReason::Upgraded);
        }

        let params = match KeepAliveParams::from_headers(headers) {
            Some(v) => v,
            None => {
                close_reason.push(CloseReason::MalformedKeepAlive);
                KeepAliveParams::default()
            }
        };

        if let Some(reason) = close_reason.first() {
            if close_reason.len() > 1 {
                let all: Vec<_> = close_reason.iter().map(|r| r.explain()).collect();
                debug!("Close reasons: {}", all.join(", "));
            }
            return KeepAlive::Closed(*reason);
        }

        KeepAlive::Open {
            budget: params.max.map(Budget::Remaining).unwrap_or(carried),
            timeout: params.timeout,
        }
    }

    /// Remaining requests, `-1` when closed and `i32::MAX` when unbounded.
    pub fn max(&self) -> i32 {
        match self {
            KeepAlive::Closed(_) => -1,
            KeepAlive::Open {
                budget: Budget::Unbounded,
                ..
            } => i32::MAX,
            KeepAlive::Open {
                budget: Budget::Remaining(n),
                ..
            } => (*n).min(i32::MAX as u32) as i32,
        }
    }

    /// Whether another request may be sent on the connection.
    pub fn is_reusable(&self) -> bool {
        match self {
            KeepAlive::Open { budget, .. } => budget.allows_reuse(),
            KeepAlive::Closed(_) => false,
        }
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        match self {
            KeepAlive::Closed(r) => Some(*r),
            KeepAlive::Open { .. } => None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self {
            KeepAlive::Open { timeout, .. } => *timeout,
            KeepAlive::Closed(_) => None,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct KeepAliveParams {
    timeout: Option<Duration>,
    max: Option<u32>,
}

impl KeepAliveParams {
    /// Parse all `Keep-Alive` headers. `None` if any of them is malformed.
    fn from_headers(headers: &HeaderMap) -> Option<KeepAliveParams> {
        let mut params = KeepAliveParams::default();

        for value in headers.get_all("keep-alive") {
            let value = value.to_str().ok()?;
            params.parse(value)?;
        }

        Some(params)
    }

    fn parse(&mut self, value: &str) -> Option<()> {
        for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, v) = match part.split_once('=') {
                Some((n, v)) => (n.trim(), Some(v.trim().trim_matches('"'))),
                None => (part, None),
            };

            if compare_lowercase_ascii(name, "timeout") {
                let secs = v?.parse::<u64>().ok()?;
                self.timeout = Some(Duration::from_secs(secs));
            } else if compare_lowercase_ascii(name, "max") {
                self.max = Some(v?.parse::<u32>().ok()?);
            }
            // other parameters are ignored
        }

        Some(())
    }
}
