use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::connect::{Target, Transport};
use crate::fill_more::FillMoreBuffer;
use crate::keep_alive::Budget;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Connection`], unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An open transport carrying a keep-alive chain.
///
/// A connection is owned by exactly one [`Request`][crate::Request] at a time.
/// Moving to the next request in a chain is a move of the value, never a
/// shared reference. Dropping a connection closes it.
pub struct Connection {
    id: ConnectionId,
    transport: Option<Box<dyn Transport>>,
    target: Target,
    buffer: FillMoreBuffer,
    budget: Budget,
    proxied: bool,
    requests: u32,
}

impl Connection {
    pub(crate) fn new(transport: Box<dyn Transport>, target: Target, proxied: bool) -> Self {
        let id = ConnectionId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        debug!("Open connection {} to {}", id, target);

        Connection {
            id,
            transport: Some(transport),
            target,
            buffer: FillMoreBuffer::new(),
            budget: Budget::Unbounded,
            proxied,
            requests: 0,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether [`Connection::close()`] has not yet been called.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Requests still permitted on this connection.
    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Number of requests sent on this connection.
    pub fn requests(&self) -> u32 {
        self.requests
    }

    /// Host and port of the request that opened the connection.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Whether a request for `target` may be sent on this connection.
    ///
    /// A direct connection only serves the host and port it was opened for.
    /// A proxied connection serves any target.
    pub fn serves(&self, target: &Target) -> bool {
        self.proxied || self.target == *target
    }

    /// Whether the connection goes through a forward proxy.
    pub fn is_proxied(&self) -> bool {
        self.proxied
    }

    /// Close the underlying transport.
    ///
    /// Closing an already closed connection does nothing. Errors from the
    /// transport while disconnecting are logged and otherwise ignored.
    pub fn close(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            return;
        };

        debug!("Close connection {} after {} requests", self.id, self.requests);

        if let Err(e) = transport.disconnect() {
            debug!("Ignoring disconnect error on {}: {}", self.id, e);
        }
    }

    pub(crate) fn set_budget(&mut self, budget: Budget) {
        self.budget = budget;
    }

    /// Account for binding the connection to one more request.
    pub(crate) fn begin_request(&mut self) {
        if self.requests > 0 {
            self.budget.consume();
        }
        self.requests += 1;
    }

    /// Whether the server ended the stream (read returned EOF).
    pub(crate) fn is_ended(&self) -> bool {
        self.buffer.is_ended()
    }

    pub(crate) fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let transport = self.transport.as_mut().ok_or_else(not_connected)?;
        io::Write::write_all(transport, bytes)?;
        io::Write::flush(transport)
    }

    /// Read more input and return everything buffered so far.
    pub(crate) fn fill_more(&mut self) -> io::Result<&[u8]> {
        let transport = self.transport.as_mut().ok_or_else(not_connected)?;
        self.buffer.fill_more(transport)
    }

    pub(crate) fn buffered(&self) -> &[u8] {
        self.buffer.buffer()
    }

    pub(crate) fn consume(&mut self, amount: usize) {
        self.buffer.consume(amount);
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection is closed")
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("open", &self.is_open())
            .field("budget", &self.budget)
            .field("requests", &self.requests)
            .field("proxied", &self.proxied)
            .finish()
    }
}
