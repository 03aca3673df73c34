use http::StatusCode;

use super::scenario::*;
use super::TestSliceExt;
use crate::connect::proxy::ProxyConnector;
use crate::connect::test::ScriptedConnector;
use crate::connect::{Connector, Target, Transport};
use crate::{CloseReason, Engine, Error, Request};

#[test]
fn partial_reads_keep_chain() {
    let (engine, connector) = engine(&[KEEP_ALIVE_MAX_2, KEEP_ALIVE_MAX_1]);
    connector.read_size(7);

    let mut r1 = engine.send_request(get()).unwrap();
    assert_eq!(r1.body().as_str(), "<html></html>");

    let r2 = engine.send(get(), Some(&mut r1)).unwrap();
    assert_eq!(r2.body().as_str(), "<html></html>");
    assert_eq!(r2.keep_alive_max(), 1);
    assert_eq!(connector.opened(), 1);
}

#[test]
fn chunked_response_is_reused() {
    let chunked = "HTTP/1.1 200 OK\r\n\
        Transfer-Encoding: chunked\r\n\
        \r\n\
        5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";
    let (engine, connector) = engine(&[chunked, chunked]);

    let mut r1 = engine.send_request(get()).unwrap();
    assert_eq!(r1.body().as_str(), "hello world");
    assert!(r1.connection_keep_alive());

    let r2 = engine.send(get(), Some(&mut r1)).unwrap();
    assert_eq!(r2.body().as_str(), "hello world");
    assert_eq!(connector.opened(), 1);
}

#[test]
fn close_delimited_response_is_not_reused() {
    let (engine, connector) = engine(&["HTTP/1.1 200 OK\r\n\r\nuntil close"]);

    let r = engine.send_request(get()).unwrap();

    assert_eq!(r.body().as_str(), "until close");
    assert_eq!(
        r.keep_alive().close_reason(),
        Some(CloseReason::CloseDelimitedBody)
    );
    assert!(r.connection().is_none());
    assert_eq!(connector.closed(), 1);
}

#[test]
fn no_content_response_is_reused() {
    let (engine, _) = engine(&["HTTP/1.1 204 No Content\r\nKeep-Alive: max=4\r\n\r\n"]);

    let r = engine.send_request(get()).unwrap();

    assert_eq!(r.status(), StatusCode::NO_CONTENT);
    assert!(r.body().is_empty());
    assert_eq!(r.keep_alive_max(), 4);
    assert!(r.connection().is_some());
}

#[test]
fn head_response_ignores_content_length() {
    let head = "HTTP/1.1 200 OK\r\nContent-Length: 13\r\nKeep-Alive: max=2\r\n\r\n";
    let (engine, connector) = engine(&[head, KEEP_ALIVE_MAX_1]);

    let mut r1 = engine
        .send_request(Request::head("http://a.test/").unwrap())
        .unwrap();
    assert!(r1.body().is_empty());
    assert!(r1.connection().is_some());

    let r2 = engine.send(get(), Some(&mut r1)).unwrap();
    assert_eq!(r2.body().as_str(), "<html></html>");
    assert_eq!(connector.opened(), 1);
}

#[test]
fn post_body_is_written() {
    let (engine, connector) = engine(&[KEEP_ALIVE_MAX_2]);

    engine
        .send_request(Request::post("http://a.test/form", "a=1").unwrap())
        .unwrap();

    let written = connector.requests();
    assert_eq!(
        written[0].as_str(),
        "POST /form HTTP/1.1\r\nhost: a.test\r\ncontent-length: 3\r\n\r\na=1"
    );
}

#[test]
fn proxy_connector_flags_connection() {
    let proxy = ProxyConnector::new(&"http://proxy.test:3128".parse().unwrap()).unwrap();
    assert!(proxy.is_proxy());
    assert_eq!(proxy.proxy().to_string(), "proxy.test:3128");

    let engine = Engine::new(proxy);
    assert!(engine.connector().is_proxy());
}

#[test]
fn proxy_rejects_https_uri() {
    let err = ProxyConnector::new(&"https://proxy.test".parse().unwrap()).unwrap_err();
    assert!(matches!(&err, Error::UnsupportedScheme(s) if s == "https"));
    assert!(!err.is_transport());
}

/// Scripted responses, but flagged as going through a proxy.
struct ScriptedProxy(ScriptedConnector);

impl Connector for ScriptedProxy {
    fn connect(&self, target: &Target) -> std::io::Result<Box<dyn Transport>> {
        self.0.connect(target)
    }

    fn is_proxy(&self) -> bool {
        true
    }
}

#[test]
fn proxied_request_uses_absolute_form() {
    let connector = ScriptedConnector::new();
    connector.push_response(KEEP_ALIVE_MAX_2);
    connector.push_response(KEEP_ALIVE_MAX_1);

    let engine = Engine::new(ScriptedProxy(connector.clone()));

    let mut r1 = engine
        .send_request(Request::get("http://a.test:8080/x?y=1").unwrap())
        .unwrap();
    assert!(r1.connection().unwrap().is_proxied());

    let r2 = engine.send(get(), Some(&mut r1)).unwrap();
    assert!(r2.connection().is_some());

    let written = connector.requests();
    assert_eq!(
        written[0].as_str(),
        "GET http://a.test:8080/x?y=1 HTTP/1.1\r\nhost: a.test:8080\r\n\r\n"
    );
    assert!(written[1].as_str().starts_with("GET http://a.test/ HTTP/1.1\r\n"));
    assert_eq!(connector.opened(), 1);
}

#[test]
fn proxied_connection_serves_any_host() {
    let connector = ScriptedConnector::new();
    connector.push_response(KEEP_ALIVE_MAX_2);
    connector.push_response(KEEP_ALIVE_MAX_1);

    let engine = Engine::new(ScriptedProxy(connector.clone()));

    let mut r1 = engine.send_request(get()).unwrap();
    let r2 = engine
        .send(Request::get("http://b.test/").unwrap(), Some(&mut r1))
        .unwrap();

    assert!(r2.connection().is_some());
    assert_eq!(connector.opened(), 1);

    let written = connector.requests();
    assert!(written[1].as_str().starts_with("GET http://b.test/ HTTP/1.1\r\n"));
}
