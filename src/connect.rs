//! Connectors that open transports for outgoing requests.
//!
//! The [`Engine`][crate::Engine] never inspects the concrete transport. It only
//! needs the byte streams ([`io::Read`]/[`io::Write`]) and a way to
//! [`disconnect`][Transport::disconnect]. Which connector to use is decided when
//! the engine is constructed:
//!
//! * [`tcp::TcpConnector`] connects directly to the request host.
//! * [`proxy::ProxyConnector`] connects to a forward proxy.
//! * [`test::ScriptedConnector`] serves canned responses without networking.

use std::fmt;
use std::io;

use http::Uri;

use crate::Error;

/// Opens a new [`Transport`] for a request target.
///
/// Each call must produce a new transport. Failure to connect is reported to the
/// caller as [`Error::Connect`] and never retried.
pub trait Connector {
    fn connect(&self, target: &Target) -> io::Result<Box<dyn Transport>>;

    /// Whether transports from this connector go to a forward proxy.
    ///
    /// Requests through a proxy are written with an absolute-form target
    /// (`GET http://host/path HTTP/1.1`).
    fn is_proxy(&self) -> bool {
        false
    }
}

/// A closable byte stream to a server.
pub trait Transport: io::Read + io::Write + Send + 'static {
    /// Tear down the transport. Called at most once per transport.
    fn disconnect(&mut self) -> io::Result<()>;
}

/// Host and port derived from a request uri.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Target {
            host: host.into(),
            port,
        }
    }

    /// Derive the target from a uri. Only `http` is supported.
    pub fn from_uri(uri: &Uri) -> Result<Self, Error> {
        match uri.scheme_str() {
            Some(s) if s.eq_ignore_ascii_case("http") => {}
            None => {}
            Some(s) => return Err(Error::UnsupportedScheme(s.to_string())),
        }

        let host = uri.host().ok_or(Error::MissingHost)?;
        let port = uri.port_u16().unwrap_or(80);

        Ok(Target::new(host, port))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl<C: Connector + ?Sized> Connector for &C {
    fn connect(&self, target: &Target) -> io::Result<Box<dyn Transport>> {
        (**self).connect(target)
    }

    fn is_proxy(&self) -> bool {
        (**self).is_proxy()
    }
}

impl<C: Connector + ?Sized> Connector for Box<C> {
    fn connect(&self, target: &Target) -> io::Result<Box<dyn Transport>> {
        (**self).connect(target)
    }

    fn is_proxy(&self) -> bool {
        (**self).is_proxy()
    }
}

pub mod tcp {
    use std::io;
    use std::net::{Shutdown, TcpStream, ToSocketAddrs};
    use std::time::Duration;

    use super::{Connector, Target, Transport};

    /// Connects directly to the request target over TCP.
    #[derive(Debug, Clone, Default)]
    pub struct TcpConnector {
        connect_timeout: Option<Duration>,
        read_timeout: Option<Duration>,
        write_timeout: Option<Duration>,
    }

    impl TcpConnector {
        pub fn new() -> Self {
            Self::default()
        }

        /// Timeout for each socket address tried when connecting.
        pub fn connect_timeout(mut self, timeout: Duration) -> Self {
            self.connect_timeout = Some(timeout);
            self
        }

        pub fn read_timeout(mut self, timeout: Duration) -> Self {
            self.read_timeout = Some(timeout);
            self
        }

        pub fn write_timeout(mut self, timeout: Duration) -> Self {
            self.write_timeout = Some(timeout);
            self
        }

        pub(crate) fn open(&self, target: &Target) -> io::Result<TcpStream> {
            let mut last_err = None;

            for addr in (target.host(), target.port()).to_socket_addrs()? {
                let result = match self.connect_timeout {
                    Some(t) => TcpStream::connect_timeout(&addr, t),
                    None => TcpStream::connect(addr),
                };

                match result {
                    Ok(stream) => {
                        stream.set_read_timeout(self.read_timeout)?;
                        stream.set_write_timeout(self.write_timeout)?;
                        stream.set_nodelay(true)?;
                        debug!("Connected {} via {}", target, addr);
                        return Ok(stream);
                    }
                    Err(e) => {
                        debug!("Failed to connect {} via {}: {}", target, addr, e);
                        last_err = Some(e);
                    }
                }
            }

            Err(last_err.unwrap_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("no socket address for {}", target),
                )
            }))
        }
    }

    impl Connector for TcpConnector {
        fn connect(&self, target: &Target) -> io::Result<Box<dyn Transport>> {
            Ok(Box::new(self.open(target)?))
        }
    }

    impl Transport for TcpStream {
        fn disconnect(&mut self) -> io::Result<()> {
            match self.shutdown(Shutdown::Both) {
                // The peer already closed. Nothing left to tear down.
                Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
                r => r,
            }
        }
    }
}

pub mod proxy {
    use std::io;

    use http::Uri;

    use super::tcp::TcpConnector;
    use super::{Connector, Target, Transport};
    use crate::Error;

    /// Connects to a forward proxy instead of the request target.
    ///
    /// The proxy receives absolute-form requests and forwards them. No
    /// `CONNECT` tunnel is negotiated.
    #[derive(Debug, Clone)]
    pub struct ProxyConnector {
        proxy: Target,
        tcp: TcpConnector,
    }

    impl ProxyConnector {
        /// Proxy given as a uri such as `http://proxy.test:3128`.
        pub fn new(proxy: &Uri) -> Result<Self, Error> {
            Ok(ProxyConnector {
                proxy: Target::from_uri(proxy)?,
                tcp: TcpConnector::new(),
            })
        }

        /// Use `tcp` for the connection to the proxy, to set timeouts.
        pub fn with_tcp(mut self, tcp: TcpConnector) -> Self {
            self.tcp = tcp;
            self
        }

        pub fn proxy(&self) -> &Target {
            &self.proxy
        }
    }

    impl Connector for ProxyConnector {
        fn connect(&self, target: &Target) -> io::Result<Box<dyn Transport>> {
            debug!("Connect {} through proxy {}", target, self.proxy);
            Ok(Box::new(self.tcp.open(&self.proxy)?))
        }

        fn is_proxy(&self) -> bool {
            true
        }
    }
}

pub mod test {
    //! A connector that plays back scripted responses.
    //!
    //! Each request written to any transport of a [`ScriptedConnector`] is
    //! answered with the next scripted response, regardless of which
    //! connection carried it. This makes it possible to check which connection
    //! was used for what without any networking.

    use std::collections::VecDeque;
    use std::io::{self, Cursor, Read};
    use std::sync::{Arc, Mutex, MutexGuard};

    use super::{Connector, Target, Transport};

    #[derive(Debug, Default)]
    struct Script {
        responses: VecDeque<Vec<u8>>,
        requests: Vec<Vec<u8>>,
        opened: usize,
        closed: usize,
        fail_connect: bool,
        fail_write: bool,
        fail_read: bool,
        read_size: Option<usize>,
    }

    /// Test double for [`Connector`] serving canned byte responses.
    ///
    /// Clones share the same script, so a test can keep one clone to inspect
    /// while the engine owns another.
    #[derive(Debug, Clone, Default)]
    pub struct ScriptedConnector {
        script: Arc<Mutex<Script>>,
    }

    impl ScriptedConnector {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a raw response to be served for the next unanswered request.
        pub fn push_response(&self, response: impl AsRef<[u8]>) {
            self.lock().responses.push_back(response.as_ref().to_vec());
        }

        /// Make subsequent connects fail with `ConnectionRefused`.
        pub fn fail_connect(&self, fail: bool) {
            self.lock().fail_connect = fail;
        }

        /// Make writes on every transport fail with `BrokenPipe`.
        pub fn fail_write(&self, fail: bool) {
            self.lock().fail_write = fail;
        }

        /// Make reads on every transport fail with `ConnectionReset`.
        pub fn fail_read(&self, fail: bool) {
            self.lock().fail_read = fail;
        }

        /// Limit each read to `size` bytes to exercise partial input.
        pub fn read_size(&self, size: usize) {
            self.lock().read_size = Some(size);
        }

        /// Number of transports opened so far.
        pub fn opened(&self) -> usize {
            self.lock().opened
        }

        /// Number of transports disconnected so far.
        pub fn closed(&self) -> usize {
            self.lock().closed
        }

        /// Raw bytes of every request written, in order.
        pub fn requests(&self) -> Vec<Vec<u8>> {
            self.lock().requests.clone()
        }

        /// Responses not yet served.
        pub fn pending(&self) -> usize {
            self.lock().responses.len()
        }

        fn lock(&self) -> MutexGuard<'_, Script> {
            // A panicking test thread poisons the lock, the script is still usable.
            self.script.lock().unwrap_or_else(|e| e.into_inner())
        }
    }

    impl Connector for ScriptedConnector {
        fn connect(&self, target: &Target) -> io::Result<Box<dyn Transport>> {
            let mut script = self.lock();

            if script.fail_connect {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    format!("scripted refusal for {}", target),
                ));
            }

            script.opened += 1;

            Ok(Box::new(ScriptedTransport {
                script: self.script.clone(),
                written: vec![],
                reading: Cursor::new(vec![]),
                read_size: script.read_size,
            }))
        }
    }

    struct ScriptedTransport {
        script: Arc<Mutex<Script>>,
        written: Vec<u8>,
        reading: Cursor<Vec<u8>>,
        read_size: Option<usize>,
    }

    impl ScriptedTransport {
        fn lock(&self) -> MutexGuard<'_, Script> {
            self.script.lock().unwrap_or_else(|e| e.into_inner())
        }
    }

    impl io::Read for ScriptedTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.lock().fail_read {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "scripted read failure",
                ));
            }
            let max = self.read_size.unwrap_or(buf.len()).min(buf.len());
            self.reading.read(&mut buf[..max])
        }
    }

    impl io::Write for ScriptedTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.lock().fail_write {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "scripted write failure",
                ));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        // A flushed request is answered with the next scripted response.
        fn flush(&mut self) -> io::Result<()> {
            if self.written.is_empty() {
                return Ok(());
            }

            let request = std::mem::take(&mut self.written);

            let next = {
                let mut script = self.lock();
                script.requests.push(request);
                script.responses.pop_front()
            };

            if let Some(response) = next {
                let mut unread = self.reading.get_ref()[self.reading.position() as usize..].to_vec();
                unread.extend_from_slice(&response);
                self.reading = Cursor::new(unread);
            }

            Ok(())
        }
    }

    impl Transport for ScriptedTransport {
        fn disconnect(&mut self) -> io::Result<()> {
            self.lock().closed += 1;
            Ok(())
        }
    }
}
