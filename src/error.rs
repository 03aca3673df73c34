use std::io;

use thiserror::Error;

/// Errors from sending a request on a keep-alive chain.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open connection: {0}")]
    Connect(io::Error),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("unsupported uri scheme: {0}")]
    UnsupportedScheme(String),

    #[error("request uri has no host")]
    MissingHost,

    #[error("bad header: {0}")]
    BadHeader(String),

    #[error("unsupported http version")]
    UnsupportedVersion,

    #[error("http parse fail: {0}")]
    HttpParseFail(String),

    #[error("http parse resulted in too many headers")]
    HttpParseTooManyHeaders,

    #[error("http response head is larger than {0} bytes")]
    ResponseHeadTooLarge(usize),

    #[error("http response missing version")]
    MissingResponseVersion,

    #[error("http response missing status")]
    ResponseMissingStatus,

    #[error("http response invalid status")]
    ResponseInvalidStatus,

    #[error("more than one content-length header")]
    TooManyContentLengthHeaders,

    #[error("content-length header not a number")]
    BadContentLengthHeader,

    #[error("chunk length is not ascii")]
    ChunkLenNotAscii,

    #[error("chunk length cannot be read as a number")]
    ChunkLenNotANumber,

    #[error("chunk expected crlf as next character")]
    ChunkExpectedCrLf,

    #[error("connection ended before the response was complete")]
    IncompleteResponse,
}

impl Error {
    /// Whether this error came from the transport rather than the request or framing.
    ///
    /// Transport errors are never retried by this crate. A caller that wants
    /// retries must send again, which opens a new connection.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Connect(_) | Error::Io(_) | Error::IncompleteResponse)
    }
}

impl From<httparse::Error> for Error {
    fn from(value: httparse::Error) -> Self {
        match value {
            httparse::Error::TooManyHeaders => Error::HttpParseTooManyHeaders,
            httparse::Error::Version => Error::UnsupportedVersion,
            httparse::Error::Status => Error::ResponseInvalidStatus,
            _ => Error::HttpParseFail(value.to_string()),
        }
    }
}

impl From<http::Error> for Error {
    fn from(value: http::Error) -> Self {
        Error::BadHeader(value.to_string())
    }
}
