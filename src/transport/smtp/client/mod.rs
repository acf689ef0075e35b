//! SMTP client
//!
//! [`SmtpConnection`] drives one SMTP session over a [`NetworkStream`]:
//! greeting, EHLO, optional STARTTLS upgrade, optional AUTH, then any number
//! of mail transactions, and QUIT.

use std::{
    fmt::Display,
    io::{self, BufRead, BufReader, Write},
    net::{Shutdown, ToSocketAddrs},
    time::Duration,
};

pub use self::net::{NetworkStream, TlsParameters, TlsParametersBuilder};
use crate::{
    address::Envelope,
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        commands::{Auth, Data, Ehlo, Mail, Noop, Quit, Rcpt, Starttls},
        error::{self, Error},
        extension::{ClientId, Extension, MailBodyParameter, MailParameter, ServerInfo},
        response::{parse_response, Response},
    },
};

pub mod mock;
pub mod net;

/// The codec used for transparency
///
/// Escapes lines starting with a dot, as described in
/// [RFC 5321, section 4.5.2](https://tools.ietf.org/html/rfc5321#section-4.5.2)
#[derive(Default, Clone, Copy, Debug)]
pub struct ClientCodec {
    escape_count: u8,
}

impl ClientCodec {
    /// Creates a new client codec
    pub fn new() -> Self {
        ClientCodec::default()
    }

    /// Adds transparency
    fn encode(&mut self, frame: &[u8], buf: &mut Vec<u8>) {
        let mut start = 0;
        for (idx, byte) in frame.iter().enumerate() {
            match self.escape_count {
                0 => self.escape_count = u8::from(*byte == b'\r'),
                1 => self.escape_count = if *byte == b'\n' { 2 } else { 0 },
                2 => self.escape_count = if *byte == b'.' { 3 } else { 0 },
                _ => unreachable!(),
            }
            if self.escape_count == 3 {
                self.escape_count = 0;
                buf.extend_from_slice(&frame[start..idx]);
                buf.extend_from_slice(b".");
                start = idx;
            }
        }
        buf.extend_from_slice(&frame[start..]);
    }
}

/// Returns the string replacing all the CRLF with "\<CRLF\>"
///
/// Used for debug displays
fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}

macro_rules! try_smtp (
    ($err: expr, $client: ident) => ({
        match $err {
            Ok(val) => val,
            Err(err) => {
                $client.abort();
                return Err(err);
            },
        }
    })
);

/// Structure that implements the SMTP client
pub struct SmtpConnection {
    /// TCP stream between client and server
    stream: BufReader<NetworkStream>,
    /// Panic state
    panic: bool,
    /// Information about the server
    server_info: ServerInfo,
}

impl SmtpConnection {
    /// Get information about the server
    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Connects to the configured server
    ///
    /// Reads the greeting banner, sends EHLO and parses server information.
    /// When `tls_parameters` is given the connection is wrapped in TLS from
    /// the first byte.
    pub fn connect<A: ToSocketAddrs>(
        server: A,
        timeout: Option<Duration>,
        hello_name: &ClientId,
        tls_parameters: Option<&TlsParameters>,
    ) -> Result<SmtpConnection, Error> {
        let stream = BufReader::new(NetworkStream::connect(server, timeout, tls_parameters)?);
        let mut conn = SmtpConnection {
            stream,
            panic: false,
            server_info: ServerInfo::default(),
        };
        conn.set_timeout(timeout).map_err(error::network)?;
        let _banner = conn.read_response()?;

        conn.ehlo(hello_name)?;

        tracing::debug!(server = %conn.server_info, "connected");
        Ok(conn)
    }

    /// Sends an email through an already connected session
    pub fn send(&mut self, envelope: &Envelope, email: &[u8]) -> Result<Response, Error> {
        let mut mail_options = vec![];

        // Internationalization handling
        //
        // * 8BITMIME: https://tools.ietf.org/html/rfc6152
        // * SMTPUTF8: https://tools.ietf.org/html/rfc6531

        if envelope.has_non_ascii_addresses() {
            if !self.server_info.supports_feature(Extension::SmtpUtfEight) {
                // don't try to send non-ascii addresses (per RFC)
                return Err(error::client(
                    "envelope contains non-ascii chars but server does not support SMTPUTF8",
                ));
            }
            mail_options.push(MailParameter::SmtpUtfEight);
        }

        if !email.is_ascii() {
            if !self.server_info.supports_feature(Extension::EightBitMime) {
                return Err(error::client(
                    "message contains non-ascii chars but server does not support 8BITMIME",
                ));
            }
            mail_options.push(MailParameter::Body(MailBodyParameter::EightBitMime));
        }

        try_smtp!(
            self.command(Mail::new(envelope.from().cloned(), mail_options)),
            self
        );

        for to_address in envelope.to() {
            try_smtp!(self.command(Rcpt::new(to_address.clone())), self);
        }

        try_smtp!(self.command(Data), self);

        let result = try_smtp!(self.message(email), self);
        Ok(result)
    }

    /// Whether the session is unusable after a protocol failure
    pub fn has_broken(&self) -> bool {
        self.panic
    }

    /// Whether STARTTLS is available and the stream is still plain
    pub fn can_starttls(&self) -> bool {
        !self.is_encrypted() && self.server_info.supports_feature(Extension::StartTls)
    }

    /// Upgrades the connection to TLS in place and sends EHLO again
    pub fn starttls(
        &mut self,
        tls_parameters: &TlsParameters,
        hello_name: &ClientId,
    ) -> Result<(), Error> {
        if !self.server_info.supports_feature(Extension::StartTls) {
            return Err(error::client("STARTTLS is not supported on this server"));
        }
        try_smtp!(self.command(Starttls), self);
        try_smtp!(self.stream.get_mut().upgrade_tls(tls_parameters), self);
        tracing::debug!("connection encrypted");
        // The server state is reset by the negotiation
        try_smtp!(self.ehlo(hello_name), self);
        Ok(())
    }

    /// Send EHLO and update server info
    fn ehlo(&mut self, hello_name: &ClientId) -> Result<(), Error> {
        let ehlo_response = try_smtp!(self.command(Ehlo::new(hello_name.clone())), self);
        self.server_info = try_smtp!(ServerInfo::from_response(&ehlo_response), self);
        Ok(())
    }

    /// Closes the SMTP session cleanly
    pub fn quit(&mut self) -> Result<Response, Error> {
        Ok(try_smtp!(self.command(Quit), self))
    }

    /// Releases the connection after a failure, sending QUIT when still
    /// possible
    pub fn abort(&mut self) {
        // Only try to quit if we are not already broken
        if !self.panic {
            self.panic = true;
            let _ = self.command(Quit);
        }
        let _ = self.stream.get_mut().shutdown(Shutdown::Both);
    }

    /// Tells if the underlying stream is currently encrypted
    pub fn is_encrypted(&self) -> bool {
        self.stream.get_ref().is_encrypted()
    }

    /// Set read and write timeouts on the underlying stream
    pub fn set_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        self.stream.get_mut().set_read_timeout(duration)?;
        self.stream.get_mut().set_write_timeout(duration)
    }

    /// Checks if the server is connected using the NOOP SMTP command
    pub fn test_connected(&mut self) -> bool {
        self.command(Noop).is_ok()
    }

    /// Sends an AUTH command with the given mechanism, and handles the
    /// challenge if needed
    pub fn auth(
        &mut self,
        mechanisms: &[Mechanism],
        credentials: &Credentials,
    ) -> Result<Response, Error> {
        let mechanism = self
            .server_info
            .get_auth_mechanism(mechanisms)
            .ok_or_else(|| error::auth("no compatible authentication mechanism was found"))?;

        // Limit challenges to avoid blocking
        let mut challenges = 10;
        let mut response = self.command(Auth::new(mechanism, credentials, None)?)?;

        while challenges > 0 && response.has_code(334) {
            challenges -= 1;
            response = try_smtp!(
                self.command(Auth::new_from_response(mechanism, credentials, &response)?),
                self
            );
        }

        if challenges == 0 {
            Err(error::response("unexpected number of challenges"))
        } else {
            Ok(response)
        }
    }

    /// Sends the message content
    pub fn message(&mut self, message: &[u8]) -> Result<Response, Error> {
        let mut out_buf: Vec<u8> = Vec::with_capacity(message.len());
        let mut codec = ClientCodec::new();
        codec.encode(message, &mut out_buf);
        self.write(out_buf.as_slice())?;
        self.write(b"\r\n.\r\n")?;
        self.read_response()
    }

    /// Sends an SMTP command
    pub fn command<C: Display>(&mut self, command: C) -> Result<Response, Error> {
        self.write(command.to_string().as_bytes())?;
        self.read_response()
    }

    /// Writes a string to the server
    fn write(&mut self, string: &[u8]) -> Result<(), Error> {
        self.stream
            .get_mut()
            .write_all(string)
            .map_err(error::network)?;
        self.stream.get_mut().flush().map_err(error::network)?;

        tracing::debug!(
            ">> {}",
            escape_crlf(String::from_utf8_lossy(string).as_ref())
        );
        Ok(())
    }

    /// Gets the SMTP response
    pub fn read_response(&mut self) -> Result<Response, Error> {
        let mut buffer = String::with_capacity(100);

        while self
            .stream
            .read_line(&mut buffer)
            .map_err(error::network)?
            > 0
        {
            tracing::debug!("<< {}", escape_crlf(&buffer));
            match parse_response(&buffer) {
                Ok((_remaining, response)) => {
                    return if response.is_positive() {
                        Ok(response)
                    } else {
                        Err(error::code(
                            response.code(),
                            Some(response.message().collect::<Vec<_>>().join("; ")),
                        ))
                    };
                }
                Err(nom::Err::Incomplete(_)) => { /* read more */ }
                Err(nom::Err::Failure(e)) => {
                    self.panic = true;
                    return Err(error::response(e.to_string()));
                }
                Err(nom::Err::Error(e)) => {
                    self.panic = true;
                    return Err(error::response(e.to_string()));
                }
            }
        }

        Err(error::response("incomplete response"))
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::{escape_crlf, mock::MockStream, ClientCodec, NetworkStream, SmtpConnection};
    use crate::{
        address::{Address, Envelope},
        transport::smtp::extension::ServerInfo,
    };

    fn codec_encode(frames: &[&[u8]]) -> String {
        let mut codec = ClientCodec::new();
        let mut buf: Vec<u8> = vec![];
        for frame in frames {
            codec.encode(frame, &mut buf);
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_codec() {
        assert_eq!(
            codec_encode(&[
                b"test\r\n",
                b".\r\n",
                b"\r\ntest",
                b"te\r\n.\r\nst",
                b"test",
                b"test.",
                b"test\n",
                b".test\n",
                b"test",
            ]),
            "test\r\n..\r\n\r\ntestte\r\n..\r\nsttesttest.test\n.test\ntest"
        );
    }

    #[test]
    fn test_escape_crlf() {
        assert_eq!(escape_crlf("\r\n"), "<CRLF>");
        assert_eq!(escape_crlf("EHLO my_name\r\n"), "EHLO my_name<CRLF>");
        assert_eq!(
            escape_crlf("EHLO my_name\r\nSIZE 42\r\n"),
            "EHLO my_name<CRLF>SIZE 42<CRLF>"
        );
    }

    fn mock_connection(responses: &str) -> (SmtpConnection, MockStream) {
        let mock = MockStream::with_vec(responses.as_bytes().to_vec());
        let conn = SmtpConnection {
            stream: std::io::BufReader::new(NetworkStream::Mock(mock.clone())),
            panic: false,
            server_info: ServerInfo::default(),
        };
        (conn, mock)
    }

    #[test]
    fn full_transaction_over_mock_stream() {
        let (mut conn, mut mock) = mock_connection(concat!(
            "250 OK\r\n", // MAIL FROM
            "250 OK\r\n", // RCPT TO
            "354 Start mail input\r\n", // DATA
            "250 OK queued\r\n", // message
        ));

        let envelope = Envelope::new(
            Some(Address::from_str("from@example.com").unwrap()),
            vec![Address::from_str("to@example.com").unwrap()],
        )
        .unwrap();

        let response = conn
            .send(&envelope, b"Subject: test\r\n\r\nbody\r\n")
            .unwrap();
        assert!(response.has_code(250));

        let written = String::from_utf8(mock.take_vec()).unwrap();
        assert_eq!(
            written,
            concat!(
                "MAIL FROM:<from@example.com>\r\n",
                "RCPT TO:<to@example.com>\r\n",
                "DATA\r\n",
                "Subject: test\r\n\r\nbody\r\n",
                "\r\n.\r\n",
            )
        );
    }

    #[test]
    fn rejected_rcpt_aborts_transaction() {
        let (mut conn, _mock) = mock_connection(concat!(
            "250 OK\r\n",                     // MAIL FROM
            "550 No such user\r\n",           // RCPT TO
            "221 Bye\r\n",                    // QUIT sent by abort
        ));

        let envelope = Envelope::new(
            Some(Address::from_str("from@example.com").unwrap()),
            vec![Address::from_str("unknown@example.com").unwrap()],
        )
        .unwrap();

        let err = conn.send(&envelope, b"body").unwrap_err();
        assert!(err.is_permanent());
        assert_eq!(err.status().map(u16::from), Some(550));
        assert!(conn.has_broken());
    }
}
