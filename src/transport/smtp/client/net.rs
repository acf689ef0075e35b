//! The stream between the client and the server, plain or encrypted

use std::{
    fmt::{self, Debug, Formatter},
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use native_tls::{Protocol, TlsConnector, TlsStream};

use super::mock::MockStream;
use crate::transport::smtp::error::{self, Error};

/// Accepted TLS protocols. This removes TLS 1.0 and 1.1 compared to the
/// native-tls defaults.
const MIN_TLS_PROTOCOL: Protocol = Protocol::Tlsv12;

/// Parameters to use for secure clients
#[derive(Clone)]
pub struct TlsParameters {
    connector: TlsConnector,
    /// The domain name the server certificate is checked against
    domain: String,
}

impl Debug for TlsParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsParameters")
            .field("domain", &self.domain)
            .finish()
    }
}

impl TlsParameters {
    /// Creates parameters verifying the server identity against `domain`
    pub fn new(domain: String) -> Result<Self, Error> {
        Self::builder(domain).build()
    }

    /// Creates a new builder for `TlsParameters`
    pub fn builder(domain: String) -> TlsParametersBuilder {
        TlsParametersBuilder {
            domain,
            accept_invalid_certs: false,
            accept_invalid_hostnames: false,
        }
    }

    /// The domain the server identity is checked against
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

/// Builder for [`TlsParameters`]
#[derive(Clone, Debug)]
pub struct TlsParametersBuilder {
    domain: String,
    accept_invalid_certs: bool,
    accept_invalid_hostnames: bool,
}

impl TlsParametersBuilder {
    /// Skip certificate verification
    ///
    /// Defeats the point of TLS against an active attacker; only meant for
    /// test servers with self-signed certificates.
    pub fn dangerous_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Skip hostname verification
    pub fn dangerous_accept_invalid_hostnames(mut self, accept: bool) -> Self {
        self.accept_invalid_hostnames = accept;
        self
    }

    /// Builds the `TlsParameters`
    pub fn build(self) -> Result<TlsParameters, Error> {
        let mut builder = TlsConnector::builder();
        builder.min_protocol_version(Some(MIN_TLS_PROTOCOL));
        builder.danger_accept_invalid_certs(self.accept_invalid_certs);
        builder.danger_accept_invalid_hostnames(self.accept_invalid_hostnames);
        let connector = builder.build().map_err(error::tls)?;
        Ok(TlsParameters {
            connector,
            domain: self.domain,
        })
    }
}

/// Represents the different types of underlying network streams
pub enum NetworkStream {
    /// Plain TCP stream
    Tcp(TcpStream),
    /// Encrypted TCP stream
    Tls(Box<TlsStream<TcpStream>>),
    /// In-memory stream for tests
    Mock(MockStream),
}

impl Debug for NetworkStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetworkStream::Tcp(_) => "NetworkStream::Tcp",
            NetworkStream::Tls(_) => "NetworkStream::Tls",
            NetworkStream::Mock(_) => "NetworkStream::Mock",
        })
    }
}

impl NetworkStream {
    /// Opens a connection, optionally wrapped in TLS from the first byte
    pub fn connect<A: ToSocketAddrs>(
        server: A,
        timeout: Option<Duration>,
        tls_parameters: Option<&TlsParameters>,
    ) -> Result<NetworkStream, Error> {
        fn try_connect(addr: &SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
            match timeout {
                Some(duration) => TcpStream::connect_timeout(addr, duration),
                None => TcpStream::connect(addr),
            }
        }

        let addrs = server.to_socket_addrs().map_err(error::connection)?;
        let mut last_err = None;
        let mut tcp_stream = None;
        for addr in addrs {
            match try_connect(&addr, timeout) {
                Ok(stream) => {
                    tcp_stream = Some(stream);
                    break;
                }
                Err(err) => last_err = Some(err),
            }
        }
        let tcp_stream = match tcp_stream {
            Some(stream) => stream,
            None => {
                return Err(match last_err {
                    Some(err) => error::connection(err),
                    None => error::connection("could not resolve to any address"),
                })
            }
        };

        match tls_parameters {
            Some(parameters) => {
                let tls_stream = parameters
                    .connector
                    .connect(parameters.domain(), tcp_stream)
                    .map_err(error::tls)?;
                Ok(NetworkStream::Tls(Box::new(tls_stream)))
            }
            None => Ok(NetworkStream::Tcp(tcp_stream)),
        }
    }

    /// Upgrades an open plain stream to TLS in place
    pub fn upgrade_tls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error> {
        match self {
            NetworkStream::Tcp(stream) => {
                let tcp_stream = stream.try_clone().map_err(error::network)?;
                let tls_stream = tls_parameters
                    .connector
                    .connect(tls_parameters.domain(), tcp_stream)
                    .map_err(error::tls)?;
                *self = NetworkStream::Tls(Box::new(tls_stream));
                Ok(())
            }
            NetworkStream::Tls(_) => Ok(()),
            NetworkStream::Mock(_) => Ok(()),
        }
    }

    /// Tells whether the stream is currently encrypted
    pub fn is_encrypted(&self) -> bool {
        matches!(self, NetworkStream::Tls(_))
    }

    /// Set read timeout for IO calls
    pub fn set_read_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match self {
            NetworkStream::Tcp(stream) => stream.set_read_timeout(duration),
            NetworkStream::Tls(stream) => stream.get_ref().set_read_timeout(duration),
            NetworkStream::Mock(_) => Ok(()),
        }
    }

    /// Set write timeout for IO calls
    pub fn set_write_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match self {
            NetworkStream::Tcp(stream) => stream.set_write_timeout(duration),
            NetworkStream::Tls(stream) => stream.get_ref().set_write_timeout(duration),
            NetworkStream::Mock(_) => Ok(()),
        }
    }

    /// Shuts the underlying TCP connection down
    pub fn shutdown(&mut self, how: Shutdown) -> io::Result<()> {
        match self {
            NetworkStream::Tcp(stream) => stream.shutdown(how),
            NetworkStream::Tls(stream) => stream.get_ref().shutdown(how),
            NetworkStream::Mock(_) => Ok(()),
        }
    }
}

impl Read for NetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            NetworkStream::Tcp(stream) => stream.read(buf),
            NetworkStream::Tls(stream) => stream.read(buf),
            NetworkStream::Mock(stream) => stream.read(buf),
        }
    }
}

impl Write for NetworkStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            NetworkStream::Tcp(stream) => stream.write(buf),
            NetworkStream::Tls(stream) => stream.write(buf),
            NetworkStream::Mock(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            NetworkStream::Tcp(stream) => stream.flush(),
            NetworkStream::Tls(stream) => stream.flush(),
            NetworkStream::Mock(stream) => stream.flush(),
        }
    }
}
