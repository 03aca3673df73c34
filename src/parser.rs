use http::{HeaderName, HeaderValue, Response, StatusCode, Version};
use httparse::EMPTY_HEADER;

use crate::Error;

/// Max number of headers to parse from an HTTP response
pub const MAX_RESPONSE_HEADERS: usize = 128;

/// Try to parse a response head (status line and headers) from `input`.
///
/// Returns `None` when more input is needed, otherwise how much input the
/// head used together with a body-less [`Response`].
pub(crate) fn try_parse_response(input: &[u8]) -> Result<Option<(usize, Response<()>)>, Error> {
    let mut headers = [EMPTY_HEADER; MAX_RESPONSE_HEADERS];
    let mut res = httparse::Response::new(&mut headers);

    let input_used = match res.parse(input)? {
        httparse::Status::Complete(v) => v,
        httparse::Status::Partial => return Ok(None),
    };

    let version = match res.version {
        Some(0) => Version::HTTP_10,
        Some(1) => Version::HTTP_11,
        Some(_) => return Err(Error::UnsupportedVersion),
        None => return Err(Error::MissingResponseVersion),
    };

    let code = res.code.ok_or(Error::ResponseMissingStatus)?;
    let status = StatusCode::from_u16(code).map_err(|_| Error::ResponseInvalidStatus)?;

    let mut response = Response::new(());
    *response.version_mut() = version;
    *response.status_mut() = status;

    let map = response.headers_mut();
    for h in res.headers.iter() {
        let name =
            HeaderName::from_bytes(h.name.as_bytes()).map_err(|e| Error::BadHeader(e.to_string()))?;
        let value =
            HeaderValue::from_bytes(h.value).map_err(|e| Error::BadHeader(e.to_string()))?;
        map.append(name, value);
    }

    trace!(
        "Parsed response head: {:?} {} ({} headers)",
        version,
        status,
        map.len()
    );

    Ok(Some((input_used, response)))
}

#[cfg(test)]
mod test {
    use super::*;

    const RESPONSE: &[u8] = b"\
        HTTP/1.1 200 OK\r\n\
        Content-Length: 123\r\n\
        Content-Type: text/plain\r\n\
        \r\n";

    #[test]
    fn parse_incomplete_response() {
        for i in 0..RESPONSE.len() - 1 {
            let r = try_parse_response(&RESPONSE[..i]).unwrap();
            assert!(r.is_none());
        }
    }

    #[test]
    fn parse_complete_response() {
        let (input_used, response) = try_parse_response(RESPONSE).unwrap().unwrap();
        assert_eq!(input_used, 66);
        assert_eq!(response.version(), Version::HTTP_11);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("content-length").unwrap(), "123");
        assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");
    }

    #[test]
    fn parse_http10_response() {
        let (_, response) = try_parse_response(b"HTTP/1.0 204 No Content\r\n\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(response.version(), Version::HTTP_10);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn parse_garbage() {
        assert!(try_parse_response(b"HTTX/1.1 200 OK\r\n\r\n").is_err());
    }
}
