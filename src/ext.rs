use http::{HeaderName, HeaderValue, Method};

use crate::util::compare_lowercase_ascii;

pub(crate) trait MethodExt {
    fn need_request_body(&self) -> bool;
}

impl MethodExt for Method {
    fn need_request_body(&self) -> bool {
        self == Method::POST || self == Method::PUT || self == Method::PATCH
    }
}

pub(crate) trait HeaderIterExt {
    /// Whether a header `key` carries the token `value`.
    ///
    /// Header values are treated as comma separated token lists and compared
    /// case insensitively, so `Connection: Keep-Alive, Upgrade` has `keep-alive`.
    fn has(self, key: &str, value: &str) -> bool;
    fn has_connection_close(self) -> bool;
    fn has_connection_keep_alive(self) -> bool;
}

impl<'a, I: Iterator<Item = (&'a HeaderName, &'a HeaderValue)>> HeaderIterExt for I {
    fn has(self, key: &str, value: &str) -> bool {
        self.filter(|i| i.0 == key)
            .filter_map(|i| i.1.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|v| compare_lowercase_ascii(v.trim(), value))
    }

    fn has_connection_close(self) -> bool {
        self.has("connection", "close")
    }

    fn has_connection_keep_alive(self) -> bool {
        self.has("connection", "keep-alive")
    }
}

#[cfg(test)]
mod test {
    use http::HeaderMap;

    use super::*;

    #[test]
    fn connection_tokens() {
        let mut map = HeaderMap::new();
        map.insert("connection", HeaderValue::from_static("Keep-Alive, Upgrade"));

        assert!(map.iter().has_connection_keep_alive());
        assert!(map.iter().has("connection", "upgrade"));
        assert!(!map.iter().has_connection_close());
    }

    #[test]
    fn connection_close_any_case() {
        let mut map = HeaderMap::new();
        map.insert("connection", HeaderValue::from_static("Close"));

        assert!(map.iter().has_connection_close());
    }
}
