//! The SMTP transport sends emails using the SMTP protocol.
//!
//! This client follows [RFC 5321](https://tools.ietf.org/html/rfc5321), and
//! is designed to send emails to a relay server, relying on it for sanity
//! and RFC compliance checks.
//!
//! It implements the following extensions:
//!
//! * 8BITMIME ([RFC 6152](https://tools.ietf.org/html/rfc6152))
//! * AUTH ([RFC 4954](http://tools.ietf.org/html/rfc4954)) with PLAIN and
//!   LOGIN mechanisms
//! * STARTTLS ([RFC 2487](http://tools.ietf.org/html/rfc2487))
//!
//! #### Simple example
//!
//! ```rust,no_run
//! use missive::{Message, SmtpTransport, Transport};
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let message = Message::builder()
//!     .from("NoBody <nobody@domain.tld>".parse()?)
//!     .to("Hei <hei@domain.tld>".parse()?)
//!     .subject("Happy new year")
//!     .body("Be happy!")?;
//!
//! // Create a local transport on port 25 and send on the local relay
//! let sender = SmtpTransport::unencrypted_localhost();
//! let report = sender.send(&message)?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! #### Authenticated encrypted relay
//!
//! ```rust,no_run
//! use missive::{
//!     transport::smtp::authentication::Credentials, Message, SmtpTransport, Transport,
//! };
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! # let message = Message::builder()
//! #     .from("nobody@domain.tld".parse()?)
//! #     .to("hei@domain.tld".parse()?)
//! #     .body("Be happy!")?;
//! let sender = SmtpTransport::relay("mail.example.com")?
//!     .credentials(Credentials::new("username".to_owned(), "password".to_owned()))
//!     .build();
//! let report = sender.send(&message)?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

pub use self::{client::TlsParameters, error::Error};
use self::{
    authentication::{Credentials, Mechanism, DEFAULT_MECHANISMS},
    client::SmtpConnection,
    extension::ClientId,
    response::Response,
};
use crate::{address::Envelope, transport::Transport};

pub mod authentication;
pub mod client;
pub mod commands;
pub mod error;
pub mod extension;
pub mod response;

// Registered port numbers:
// https://www.iana.org/assignments/service-names-port-numbers/service-names-port-numbers.xhtml

/// Default smtp port
pub const SMTP_PORT: u16 = 25;
/// Default submission port
pub const SUBMISSION_PORT: u16 = 587;
/// Default submission over TLS port
///
/// <https://tools.ietf.org/html/rfc8314>
pub const SUBMISSIONS_PORT: u16 = 465;

/// Default timeout for network operations
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How to apply TLS to a client connection
#[derive(Clone, Debug)]
#[allow(missing_copy_implementations)]
pub enum Tls {
    /// Insecure connection only (for testing purposes)
    None,
    /// Start with an insecure connection and use `STARTTLS` when available
    Opportunistic(TlsParameters),
    /// Start with an insecure connection and require `STARTTLS`
    Required(TlsParameters),
    /// Use a TLS wrapped connection from the first byte
    Wrapper(TlsParameters),
}

/// Sends emails using the SMTP protocol
#[derive(Clone)]
pub struct SmtpTransport {
    inner: SmtpClient,
}

impl Transport for SmtpTransport {
    type Ok = Response;
    type Error = Error;

    /// Sends an email in a single transaction, releasing the connection on
    /// every exit path
    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error> {
        let mut conn = self.inner.connection()?;

        match conn.send(envelope, email) {
            Ok(response) => {
                conn.quit()?;
                Ok(response)
            }
            Err(err) => {
                conn.abort();
                Err(err)
            }
        }
    }
}

impl SmtpTransport {
    /// Creates a new SMTP client builder
    ///
    /// Defaults are:
    ///
    /// * No encryption
    /// * No authentication
    /// * A 60 second timeout for smtp commands
    /// * Port 587
    pub fn builder<T: Into<String>>(server: T) -> SmtpTransportBuilder {
        let info = SmtpInfo {
            server: server.into(),
            ..Default::default()
        };
        SmtpTransportBuilder { info }
    }

    /// Simple and secure transport, should be used when possible.
    ///
    /// Creates an encrypted transport over the submissions port, using the
    /// provided domain to validate TLS certificates.
    pub fn relay(relay: &str) -> Result<SmtpTransportBuilder, Error> {
        let tls_parameters = TlsParameters::new(relay.to_owned())?;

        Ok(Self::builder(relay)
            .port(SUBMISSIONS_PORT)
            .tls(Tls::Wrapper(tls_parameters)))
    }

    /// Creates a transport upgrading the connection with `STARTTLS` on the
    /// submission port, using the provided domain to validate TLS
    /// certificates.
    pub fn starttls_relay(relay: &str) -> Result<SmtpTransportBuilder, Error> {
        let tls_parameters = TlsParameters::new(relay.to_owned())?;

        Ok(Self::builder(relay)
            .port(SUBMISSION_PORT)
            .tls(Tls::Required(tls_parameters)))
    }

    /// Creates a new local SMTP client to port 25
    ///
    /// Shortcut for a local unencrypted relay (typical local email daemon
    /// that will handle relaying).
    pub fn unencrypted_localhost() -> SmtpTransport {
        Self::builder("localhost").port(SMTP_PORT).build()
    }
}

/// Client configuration
#[derive(Clone, Debug)]
struct SmtpInfo {
    /// Name sent during EHLO
    hello_name: ClientId,
    /// Server we are connecting to
    server: String,
    /// Port to connect to
    port: u16,
    /// TLS security configuration
    tls: Tls,
    /// Accepted authentication mechanisms
    authentication: Vec<Mechanism>,
    /// Credentials; their presence makes the AUTH step mandatory
    credentials: Option<Credentials>,
    /// Network timeout for connect, read and write
    timeout: Option<Duration>,
}

impl SmtpInfo {
    /// The `host:port` endpoint string
    fn server_name(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

impl Default for SmtpInfo {
    fn default() -> Self {
        Self {
            server: "localhost".to_owned(),
            port: SUBMISSION_PORT,
            hello_name: ClientId::default(),
            credentials: None,
            authentication: DEFAULT_MECHANISMS.into(),
            timeout: Some(DEFAULT_TIMEOUT),
            tls: Tls::None,
        }
    }
}

/// Builder for the SMTP `SmtpTransport`
#[derive(Clone, Debug)]
pub struct SmtpTransportBuilder {
    info: SmtpInfo,
}

impl SmtpTransportBuilder {
    /// Set the name used during EHLO
    pub fn hello_name(mut self, name: ClientId) -> Self {
        self.info.hello_name = name;
        self
    }

    /// Set the credentials to use for the AUTH step
    pub fn credentials<C: Into<Credentials>>(mut self, credentials: C) -> Self {
        self.info.credentials = Some(credentials.into());
        self
    }

    /// Set the authentication mechanisms to try
    pub fn authentication(mut self, mechanisms: Vec<Mechanism>) -> Self {
        self.info.authentication = mechanisms;
        self
    }

    /// Set the timeout duration, or `None` to block indefinitely
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.info.timeout = timeout;
        self
    }

    /// Set the port to use
    pub fn port(mut self, port: u16) -> Self {
        self.info.port = port;
        self
    }

    /// Set the TLS settings to use
    pub fn tls(mut self, tls: Tls) -> Self {
        self.info.tls = tls;
        self
    }

    /// Build the transport
    pub fn build(self) -> SmtpTransport {
        SmtpTransport {
            inner: SmtpClient { info: self.info },
        }
    }
}

/// Build client
#[derive(Clone)]
struct SmtpClient {
    info: SmtpInfo,
}

impl SmtpClient {
    /// Creates a new connection directly usable to send emails
    ///
    /// Handles encryption and authentication
    fn connection(&self) -> Result<SmtpConnection, Error> {
        let mut conn = SmtpConnection::connect(
            self.info.server_name().as_str(),
            self.info.timeout,
            &self.info.hello_name,
            match &self.info.tls {
                Tls::Wrapper(tls_parameters) => Some(tls_parameters),
                _ => None,
            },
        )?;

        match &self.info.tls {
            Tls::Opportunistic(tls_parameters) => {
                if conn.can_starttls() {
                    conn.starttls(tls_parameters, &self.info.hello_name)?;
                }
            }
            Tls::Required(tls_parameters) => {
                conn.starttls(tls_parameters, &self.info.hello_name)?;
            }
            _ => (),
        }

        if let Some(credentials) = &self.info.credentials {
            conn.auth(&self.info.authentication, credentials)?;
        }

        Ok(conn)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn server_name_is_host_colon_port() {
        let builder = SmtpTransport::builder("mail.example.com").port(SMTP_PORT);
        assert_eq!(builder.info.server_name(), "mail.example.com:25");
    }

    #[test]
    fn builder_defaults() {
        let builder = SmtpTransport::builder("mail.example.com");
        assert_eq!(builder.info.port, SUBMISSION_PORT);
        assert_eq!(builder.info.timeout, Some(DEFAULT_TIMEOUT));
        assert!(builder.info.credentials.is_none());
        assert!(matches!(builder.info.tls, Tls::None));
    }
}
