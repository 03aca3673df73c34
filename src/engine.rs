use crate::codec::{read_response, write_request};
use crate::conn::Connection;
use crate::connect::{Connector, Target};
use crate::keep_alive::KeepAlive;
use crate::{Error, Request, Response};

/// Sends requests, reusing connections along a keep-alive chain.
///
/// The engine itself holds no state besides the [`Connector`]. Connections
/// travel with the [`Request`] and [`Response`] values.
///
/// ```
/// use linger::connect::test::ScriptedConnector;
/// use linger::{Engine, Request};
///
/// let connector = ScriptedConnector::new();
/// connector.push_response("HTTP/1.1 200 OK\r\nKeep-Alive: max=5\r\nContent-Length: 2\r\n\r\nok");
/// connector.push_response("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
///
/// let engine = Engine::new(connector.clone());
///
/// let mut first = engine.send_request(Request::get("http://a.test/")?)?;
/// assert_eq!(first.keep_alive_max(), 5);
///
/// let second = engine.send(Request::get("http://a.test/")?, Some(&mut first))?;
/// assert_eq!(second.keep_alive_max(), 4);
/// assert_eq!(connector.opened(), 1);
/// # Ok::<_, linger::Error>(())
/// ```
#[derive(Debug)]
pub struct Engine<C> {
    connector: C,
}

impl<C: Connector> Engine<C> {
    pub fn new(connector: C) -> Self {
        Engine { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Send `request`, continuing the chain of `prior` when given.
    ///
    /// The connection of `prior` is moved to `request` if it may carry another
    /// request to the same host and port, otherwise it is closed and a new one
    /// is opened. After the
    /// response is read, the connection stays bound only while it remains
    /// reusable. A retired connection is closed before returning, and the
    /// request is marked with `Connection: Close`.
    pub fn send(&self, mut request: Request, prior: Option<&mut Response>) -> Result<Response, Error> {
        if let Some(prior) = prior {
            request.reuse_from(prior);
        }
        self.dispatch(request)
    }

    /// Send `request` on its own bound connection, or a new one.
    pub fn send_request(&self, request: Request) -> Result<Response, Error> {
        self.dispatch(request)
    }

    fn dispatch(&self, mut request: Request) -> Result<Response, Error> {
        let target = Target::from_uri(request.uri())?;

        let bound = request.take_connection().and_then(|mut conn| {
            if conn.serves(&target) {
                Some(conn)
            } else {
                debug!("Connection {} does not serve {}", conn.id(), target);
                conn.close();
                None
            }
        });

        let mut conn = match bound {
            Some(conn) => {
                debug!("Reuse connection {} for {}", conn.id(), target);
                conn
            }
            None => {
                let transport = self.connector.connect(&target).map_err(Error::Connect)?;
                Connection::new(transport, target, self.connector.is_proxy())
            }
        };

        conn.begin_request();
        let carried = conn.budget();

        let (inner, close_delimited) = match exchange(&mut conn, &request) {
            Ok(v) => v,
            Err(e) => {
                debug!("Discard connection {}: {}", conn.id(), e);
                conn.close();
                return Err(e);
            }
        };

        let keep_alive = KeepAlive::for_response(
            request.connection_keep_alive(),
            &inner,
            close_delimited,
            carried,
        );

        match keep_alive {
            KeepAlive::Open { budget, .. } if budget.allows_reuse() => {
                debug!("Keep connection {} ({:?})", conn.id(), budget);
                conn.set_budget(budget);
                request.bind(conn);
            }
            _ => {
                let why = keep_alive
                    .close_reason()
                    .map(|r| r.explain())
                    .unwrap_or("keep-alive max reached");
                debug!("Retire connection {}: {}", conn.id(), why);
                conn.close();
                request.set_connection_keep_alive(false);
            }
        }

        Ok(Response::new(inner, keep_alive, request))
    }
}

fn exchange(conn: &mut Connection, request: &Request) -> Result<(http::Response<Vec<u8>>, bool), Error> {
    let bytes = write_request(request, conn.is_proxied())?;
    conn.write_all(&bytes)?;
    read_response(conn, request.method())
}
