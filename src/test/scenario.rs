use crate::connect::test::ScriptedConnector;
use crate::{Engine, Request, Session};

pub const KEEP_ALIVE_MAX_2: &str = "HTTP/1.1 200 OK\r\n\
    Content-Type: text/html; charset=utf-8\r\n\
    Content-Length: 13\r\n\
    Connection: Keep-Alive\r\n\
    Keep-Alive: timeout=100, max=2\r\n\
    \r\n\
    <html></html>";

pub const KEEP_ALIVE_MAX_1: &str = "HTTP/1.1 200 OK\r\n\
    Content-Type: text/html; charset=utf-8\r\n\
    Content-Length: 13\r\n\
    Connection: Keep-Alive\r\n\
    Keep-Alive: timeout=100, max=1\r\n\
    \r\n\
    <html></html>";

pub const CONNECTION_CLOSE: &str = "HTTP/1.1 200 OK\r\n\
    Content-Type: text/html; charset=utf-8\r\n\
    Content-Length: 13\r\n\
    Connection: Close\r\n\
    \r\n\
    <html></html>";

/// A connector that answers the four step chain: max=2, max=1, close, max=2.
pub fn four_step_connector() -> ScriptedConnector {
    let connector = ScriptedConnector::new();
    for r in [
        KEEP_ALIVE_MAX_2,
        KEEP_ALIVE_MAX_1,
        CONNECTION_CLOSE,
        KEEP_ALIVE_MAX_2,
    ] {
        connector.push_response(r);
    }
    connector
}

pub fn engine(responses: &[&str]) -> (Engine<ScriptedConnector>, ScriptedConnector) {
    let connector = ScriptedConnector::new();
    for r in responses {
        connector.push_response(r);
    }
    (Engine::new(connector.clone()), connector)
}

pub fn session(responses: &[&str]) -> (Session<ScriptedConnector>, ScriptedConnector) {
    let (engine, connector) = engine(responses);
    (Session::with_engine(engine), connector)
}

pub fn get() -> Request {
    // The unwrap is ok, the uri is static.
    Request::get("http://a.test/").unwrap()
}
