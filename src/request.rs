use std::fmt;

use http::header::CONNECTION;
use http::{HeaderMap, HeaderValue, Method, Uri, Version};

use crate::conn::Connection;
use crate::connect::Target;
use crate::ext::HeaderIterExt;
use crate::{Error, Response};

/// An outgoing request in a keep-alive chain.
///
/// Wraps an [`http::Request`] with the caller's keep-alive intent and, once
/// sent, the [`Connection`] that carried it. The connection stays with the
/// request only while it may be reused. It is gone once retired, so callers
/// must check [`Request::connection()`] rather than assume liveness.
pub struct Request {
    inner: http::Request<Vec<u8>>,
    keep_alive: bool,
    connection: Option<Connection>,
}

impl Request {
    /// Wrap an `http::Request`.
    ///
    /// HTTP/1.1 requests default to keep-alive unless they carry
    /// `Connection: close`. HTTP/1.0 requests default to closing unless they
    /// carry `Connection: keep-alive`.
    pub fn new<B: Into<Vec<u8>>>(request: http::Request<B>) -> Self {
        let (parts, body) = request.into_parts();
        let inner = http::Request::from_parts(parts, body.into());

        let headers = inner.headers();
        let keep_alive = if inner.version() == Version::HTTP_10 {
            headers.iter().has_connection_keep_alive()
        } else {
            !headers.iter().has_connection_close()
        };

        Request {
            inner,
            keep_alive,
            connection: None,
        }
    }

    /// A `GET` request without body.
    pub fn get(uri: &str) -> Result<Self, Error> {
        Ok(Request::new(http::Request::get(uri).body(Vec::<u8>::new())?))
    }

    /// A `HEAD` request.
    pub fn head(uri: &str) -> Result<Self, Error> {
        Ok(Request::new(http::Request::head(uri).body(Vec::<u8>::new())?))
    }

    /// A `POST` request with a body.
    pub fn post(uri: &str, body: impl Into<Vec<u8>>) -> Result<Self, Error> {
        let body: Vec<u8> = body.into();
        Ok(Request::new(http::Request::post(uri).body(body)?))
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// First value of header `name`, if it is valid utf-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        self.inner.body()
    }

    /// Whether the caller wants the connection kept alive after this request.
    pub fn connection_keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Set the keep-alive intent.
    ///
    /// Turning it off sets `Connection: Close`. Turning it on removes that
    /// header again, and for HTTP/1.0 asks for `Connection: Keep-Alive`.
    pub fn set_connection_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;

        let version = self.version();
        let headers = self.inner.headers_mut();

        if !keep_alive {
            headers.insert(CONNECTION, HeaderValue::from_static("Close"));
        } else if version == Version::HTTP_10 {
            headers.insert(CONNECTION, HeaderValue::from_static("Keep-Alive"));
        } else if headers.iter().has_connection_close() {
            headers.remove(CONNECTION);
        }
    }

    /// The connection bound to this request, while it is still reusable.
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// Continue the chain of `prior`, reusing its connection when possible.
    ///
    /// This turns on the keep-alive intent. Returns whether the connection of
    /// `prior` was taken over. When it was not, any stale connection of
    /// `prior` is closed and the request will open a new one when sent.
    pub fn keep_alive_continue(&mut self, prior: &mut Response) -> bool {
        self.set_connection_keep_alive(true);
        self.reuse_from(prior)
    }

    /// Move the connection of `prior` to this request if its budget allows one
    /// more request and it goes to the same host and port. Otherwise close it.
    pub(crate) fn reuse_from(&mut self, prior: &mut Response) -> bool {
        let reusable = prior.keep_alive().is_reusable();

        let Some(mut conn) = prior.take_connection() else {
            return false;
        };

        let serves = Target::from_uri(self.uri()).is_ok_and(|t| conn.serves(&t));

        if reusable && serves && conn.is_open() && !conn.is_ended() && conn.budget().allows_reuse()
        {
            if let Some(mut previous) = self.connection.replace(conn) {
                previous.close();
            }
            true
        } else {
            debug!("Not reusing stale connection {}", conn.id());
            conn.close();
            false
        }
    }

    pub(crate) fn bind(&mut self, connection: Connection) {
        self.connection = Some(connection);
    }

    pub(crate) fn take_connection(&mut self) -> Option<Connection> {
        self.connection.take()
    }

    pub fn into_http(self) -> http::Request<Vec<u8>> {
        self.inner
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", self.method())
            .field("uri", self.uri())
            .field("keep_alive", &self.keep_alive)
            .field("connection", &self.connection.as_ref().map(|c| c.id()))
            .finish()
    }
}
