use std::fmt;

use http::{HeaderMap, Method, StatusCode, Version};

use crate::chunk::Dechunker;
use crate::util::compare_lowercase_ascii;
use crate::Error;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyReader {
    /// No body is expected either due to the status or method.
    NoBody,
    /// Delimited by content-length.
    /// The value is what's left to receive.
    LengthDelimited(u64),
    /// Chunked transfer encoding
    Chunked(Dechunker),
    /// Expect remote to close at end of body.
    CloseDelimited,
}

impl BodyReader {
    pub fn for_response(
        method: &Method,
        status: StatusCode,
        version: Version,
        headers: &HeaderMap,
    ) -> Result<Self, Error> {
        let has_no_body =
            // https://datatracker.ietf.org/doc/html/rfc2616#section-4.3
            // All responses to the HEAD request method
            // MUST NOT include a message-body, even though the presence of entity-
            // header fields might lead one to believe they do.
            method == Method::HEAD ||
            // A client MUST ignore any Content-Length or Transfer-Encoding
            // header fields received in a successful response to CONNECT.
            status.is_success() && method == Method::CONNECT ||
            // All 1xx (informational), 204 (no content), and 304 (not modified) responses
            // MUST NOT include a message-body.
            status.is_informational() ||
            matches!(status.as_u16(), 204 | 304);

        if has_no_body {
            return Ok(Self::NoBody);
        }

        Self::header_defined(version == Version::HTTP_10, headers)
    }

    fn header_defined(http10: bool, headers: &HeaderMap) -> Result<Self, Error> {
        let mut content_length: Option<u64> = None;

        for value in headers.get_all("content-length") {
            let v = value
                .to_str()
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok())
                .ok_or(Error::BadContentLengthHeader)?;
            if content_length.is_some_and(|c| c != v) {
                return Err(Error::TooManyContentLengthHeaders);
            }
            content_length = Some(v);
        }

        let chunked = headers
            .get_all("transfer-encoding")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|v| compare_lowercase_ascii(v.trim(), "chunked"));

        if chunked && !http10 {
            // https://datatracker.ietf.org/doc/html/rfc2616#section-4.4
            // Messages MUST NOT include both a Content-Length header field and a
            // non-identity transfer-coding. If the message does include a non-
            // identity transfer-coding, the Content-Length MUST be ignored.
            return Ok(Self::Chunked(Dechunker::new()));
        }

        if let Some(len) = content_length {
            return Ok(Self::LengthDelimited(len));
        }

        Ok(Self::CloseDelimited)
    }

    /// Move body bytes from `src` to `dst`. Returns how much of `src` was used.
    pub fn read(&mut self, src: &[u8], dst: &mut Vec<u8>) -> Result<usize, Error> {
        trace!("Read body {:?}: {}", self, src.len());

        match self {
            BodyReader::NoBody => Ok(0),
            BodyReader::LengthDelimited(left) => {
                let left_usize = (*left).min(usize::MAX as u64) as usize;
                let to_read = src.len().min(left_usize);
                dst.extend_from_slice(&src[..to_read]);
                *left -= to_read as u64;
                Ok(to_read)
            }
            BodyReader::Chunked(dechunker) => dechunker.parse_input(src, dst),
            BodyReader::CloseDelimited => {
                dst.extend_from_slice(src);
                Ok(src.len())
            }
        }
    }

    pub fn is_ended(&self) -> bool {
        match self {
            BodyReader::NoBody => true,
            BodyReader::LengthDelimited(v) => *v == 0,
            BodyReader::Chunked(v) => v.is_ended(),
            BodyReader::CloseDelimited => false,
        }
    }

    pub fn is_close_delimited(&self) -> bool {
        matches!(self, BodyReader::CloseDelimited)
    }
}

impl fmt::Debug for BodyReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBody => write!(f, "NoBody"),
            Self::LengthDelimited(arg0) => f.debug_tuple("LengthDelimited").field(arg0).finish(),
            Self::Chunked(_) => write!(f, "Chunked"),
            Self::CloseDelimited => write!(f, "CloseDelimited"),
        }
    }
}
