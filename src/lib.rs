//! HTTP/1.1 client connection reuse.
//!
//! Decides, from the headers of each response, whether the connection that
//! carried it can take the next request of a chain, and retires it as soon as
//! it cannot. Message framing is kept minimal.
//!
//! A chain is either threaded by hand through [`Engine::send()`], passing the
//! previous [`Response`] as the reuse hint, or managed by a [`Session`].
//!
//! ```
//! use linger::connect::test::ScriptedConnector;
//! use linger::{Engine, Request};
//!
//! let connector = ScriptedConnector::new();
//! connector.push_response(
//!     "HTTP/1.1 200 OK\r\n\
//!     Keep-Alive: timeout=100, max=1\r\n\
//!     Content-Length: 5\r\n\
//!     \r\n\
//!     hello",
//! );
//! connector.push_response("HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nbye");
//!
//! let engine = Engine::new(connector.clone());
//!
//! let mut first = engine.send_request(Request::get("http://a.test/")?)?;
//! assert_eq!(first.body(), b"hello");
//! assert_eq!(first.keep_alive_max(), 1);
//! assert!(first.connection().is_some());
//!
//! // The one permitted follow-up uses up the connection.
//! let second = engine.send(Request::get("http://a.test/")?, Some(&mut first))?;
//! assert_eq!(second.keep_alive_max(), 0);
//! assert!(!second.connection_keep_alive());
//! assert!(second.connection().is_none());
//! assert_eq!(second.request().header("connection"), Some("Close"));
//!
//! assert_eq!(connector.opened(), 1);
//! assert_eq!(connector.closed(), 1);
//! # Ok::<_, linger::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

#[macro_use]
extern crate log;

// Re-export this
pub use http;

mod util;

mod ext;

mod chunk;

mod body;

mod parser;
pub use parser::MAX_RESPONSE_HEADERS;

mod fill_more;

mod error;
pub use error::Error;

pub mod connect;

mod conn;
pub use conn::{Connection, ConnectionId};

mod keep_alive;
pub use keep_alive::{Budget, CloseReason, KeepAlive};

mod request;
pub use request::Request;

mod response;
pub use response::Response;

mod codec;
pub use codec::MAX_HEAD_SIZE;

mod engine;
pub use engine::Engine;

mod session;
pub use session::Session;

#[cfg(test)]
mod test;
