use crate::connect::Connector;
use crate::{Engine, Error, Request, Response};

/// Remembers the last response so successive requests chain on one connection.
///
/// ```
/// use linger::connect::test::ScriptedConnector;
/// use linger::{Request, Session};
///
/// let connector = ScriptedConnector::new();
/// connector.push_response("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
/// connector.push_response("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
///
/// let mut session = Session::new(connector.clone());
/// session.send_request(Request::get("http://a.test/one")?)?;
/// session.send_request(Request::get("http://a.test/two")?)?;
/// session.close();
///
/// assert_eq!(connector.opened(), 1);
/// assert_eq!(connector.closed(), 1);
/// # Ok::<_, linger::Error>(())
/// ```
#[derive(Debug)]
pub struct Session<C> {
    engine: Engine<C>,
    keep_alive: bool,
    last: Option<Response>,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C) -> Self {
        Self::with_engine(Engine::new(connector))
    }

    pub fn with_engine(engine: Engine<C>) -> Self {
        Session {
            engine,
            keep_alive: true,
            last: None,
        }
    }

    /// Toggle keep-alive for subsequent sends. On by default.
    ///
    /// With keep-alive off, each send closes the previous connection, and the
    /// request goes out on a new one with `Connection: Close`.
    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Send `request` as the next step of the chain.
    ///
    /// On error the previous response is already consumed, so the next send
    /// starts a new chain.
    pub fn send_request(&mut self, mut request: Request) -> Result<&Response, Error> {
        let mut prior = self.last.take();

        let response = if self.keep_alive {
            request.set_connection_keep_alive(true);
            self.engine.send(request, prior.as_mut())?
        } else {
            if let Some(prior) = prior.as_mut() {
                prior.close();
            }
            request.set_connection_keep_alive(false);
            self.engine.send(request, None)?
        };

        Ok(self.last.insert(response))
    }

    /// The most recent response, if any.
    pub fn last_response(&self) -> Option<&Response> {
        self.last.as_ref()
    }

    /// Take the most recent response out of the session.
    ///
    /// A still bound connection goes with it, and the next send opens a new one.
    pub fn take_response(&mut self) -> Option<Response> {
        self.last.take()
    }

    /// Close the bound connection, if any, and forget the last response.
    pub fn close(&mut self) {
        if let Some(mut last) = self.last.take() {
            last.close();
        }
    }

    pub fn engine(&self) -> &Engine<C> {
        &self.engine
    }
}
