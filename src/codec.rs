//! Minimal HTTP/1.1 framing: request to bytes, bytes to response.

use std::io::Write;

use http::header::{CONTENT_LENGTH, HOST};
use http::{Method, StatusCode, Uri, Version};

use crate::body::BodyReader;
use crate::conn::Connection;
use crate::ext::{HeaderIterExt, MethodExt};
use crate::parser::try_parse_response;
use crate::{Error, Request};

/// Max size of a response status line plus headers.
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Serialize a request, including body.
///
/// `Host` is taken from the uri unless set. Non-empty bodies, and methods that
/// require one, get a `Content-Length` unless the request is chunked.
/// Through a proxy the request target is the absolute uri.
pub(crate) fn write_request(request: &Request, proxied: bool) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(256 + request.body().len());

    let version = match request.version() {
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        _ => return Err(Error::UnsupportedVersion),
    };

    let target = request_target(request.uri(), proxied)?;
    write!(out, "{} {} {}\r\n", request.method(), target, version)?;

    let headers = request.headers();

    if !headers.contains_key(HOST) {
        let host = request.uri().host().ok_or(Error::MissingHost)?;
        match request.uri().port_u16() {
            Some(port) => write!(out, "host: {}:{}\r\n", host, port)?,
            None => write!(out, "host: {}\r\n", host)?,
        }
    }

    let chunked = headers.iter().has("transfer-encoding", "chunked");
    let body = request.body();

    let need_length = !chunked
        && !headers.contains_key(CONTENT_LENGTH)
        && (!body.is_empty() || request.method().need_request_body());

    for (name, value) in headers {
        write!(out, "{}: ", name)?;
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    if need_length {
        write!(out, "{}: {}\r\n", CONTENT_LENGTH, body.len())?;
    }

    out.extend_from_slice(b"\r\n");

    if chunked {
        if !body.is_empty() {
            write!(out, "{:x}\r\n", body.len())?;
            out.extend_from_slice(body);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"0\r\n\r\n");
    } else {
        out.extend_from_slice(body);
    }

    trace!(
        "Request {} {} {} ({} bytes)",
        request.method(),
        target,
        version,
        out.len()
    );

    Ok(out)
}

fn request_target(uri: &Uri, proxied: bool) -> Result<String, Error> {
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let path = if path.is_empty() { "/" } else { path };

    if !proxied {
        return Ok(path.to_string());
    }

    let scheme = uri.scheme_str().unwrap_or("http");
    let host = uri.host().ok_or(Error::MissingHost)?;

    Ok(match uri.port_u16() {
        Some(port) => format!("{}://{}:{}{}", scheme, host, port, path),
        None => format!("{}://{}{}", scheme, host, path),
    })
}

/// Read one response from the connection.
///
/// Interim `1xx` responses (except `101`) are skipped. Input after the
/// response stays buffered in the connection. Also returns whether the body
/// was delimited by the server closing the connection.
pub(crate) fn read_response(
    conn: &mut Connection,
    method: &Method,
) -> Result<(http::Response<Vec<u8>>, bool), Error> {
    let head = loop {
        match try_parse_response(conn.buffered())? {
            Some((input_used, head)) => {
                conn.consume(input_used);

                let status = head.status();
                if status.is_informational() && status != StatusCode::SWITCHING_PROTOCOLS {
                    trace!("Skip interim response: {}", status);
                    continue;
                }

                break head;
            }
            None => {
                if conn.buffered().len() > MAX_HEAD_SIZE {
                    return Err(Error::ResponseHeadTooLarge(MAX_HEAD_SIZE));
                }
                if conn.is_ended() {
                    return Err(Error::IncompleteResponse);
                }
                conn.fill_more()?;
            }
        }
    };

    let mut reader = BodyReader::for_response(method, head.status(), head.version(), head.headers())?;
    let close_delimited = reader.is_close_delimited();

    let mut body = vec![];

    loop {
        let input_used = reader.read(conn.buffered(), &mut body)?;
        conn.consume(input_used);

        if reader.is_ended() {
            break;
        }

        if conn.is_ended() {
            if close_delimited {
                break;
            }
            return Err(Error::IncompleteResponse);
        }

        conn.fill_more()?;
    }

    trace!("Response {} with {} bytes body", head.status(), body.len());

    let (parts, _) = head.into_parts();
    Ok((http::Response::from_parts(parts, body), close_delimited))
}
