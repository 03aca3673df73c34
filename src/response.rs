use std::fmt;

use http::{HeaderMap, StatusCode, Version};

use crate::conn::Connection;
use crate::keep_alive::{CloseReason, KeepAlive};
use crate::Request;

/// A response read from a connection, with its resolved keep-alive state.
///
/// The response holds the [`Request`] that produced it. While the connection
/// may be reused, it stays bound to that request and is visible through
/// [`Response::connection()`]. Pass the response to the next send to continue
/// the chain on the same connection.
pub struct Response {
    inner: http::Response<Vec<u8>>,
    keep_alive: KeepAlive,
    request: Request,
}

impl Response {
    pub(crate) fn new(inner: http::Response<Vec<u8>>, keep_alive: KeepAlive, request: Request) -> Self {
        Response {
            inner,
            keep_alive,
            request,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// First value of header `name`, if it is valid utf-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        self.inner.body()
    }

    /// The request that produced this response.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn keep_alive(&self) -> KeepAlive {
        self.keep_alive
    }

    /// Requests the server still permits on the connection after this one.
    ///
    /// `-1` means the connection is closed and must not be reused. `i32::MAX`
    /// means the server placed no limit.
    pub fn keep_alive_max(&self) -> i32 {
        self.keep_alive.max()
    }

    /// Whether the connection may carry another request.
    ///
    /// When `false`, the connection is already closed and detached from both
    /// this response and its request.
    pub fn connection_keep_alive(&self) -> bool {
        self.keep_alive.is_reusable()
    }

    /// The connection that produced this response, while still reusable.
    pub fn connection(&self) -> Option<&Connection> {
        self.request.connection()
    }

    /// Close the connection of this response, if any.
    ///
    /// Calling this more than once is fine.
    pub fn close(&mut self) {
        if let Some(mut conn) = self.request.take_connection() {
            conn.close();
        }
        if self.keep_alive.close_reason().is_none() {
            self.keep_alive = KeepAlive::Closed(CloseReason::Explicit);
        }
    }

    pub(crate) fn take_connection(&mut self) -> Option<Connection> {
        self.request.take_connection()
    }

    /// Split into the `http::Response` and the request that produced it.
    ///
    /// A still bound connection goes with the request.
    pub fn into_parts(self) -> (http::Response<Vec<u8>>, Request) {
        (self.inner, self.request)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status())
            .field("keep_alive", &self.keep_alive)
            .field("request", &self.request)
            .finish()
    }
}
