//! SMTP commands

use std::fmt::{self, Display, Formatter};

use crate::{
    base64,
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        error::{self, Error},
        extension::{ClientId, MailParameter},
        response::Response,
    },
    Address,
};

/// EHLO command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Ehlo {
    client_id: ClientId,
}

impl Display for Ehlo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "EHLO {}\r\n", self.client_id)
    }
}

impl Ehlo {
    /// Creates an EHLO command
    pub fn new(client_id: ClientId) -> Ehlo {
        Ehlo { client_id }
    }
}

/// STARTTLS command
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Starttls;

impl Display for Starttls {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("STARTTLS\r\n")
    }
}

/// MAIL command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Mail {
    sender: Option<Address>,
    parameters: Vec<MailParameter>,
}

impl Display for Mail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAIL FROM:<{}>",
            self.sender.as_ref().map(|s| s.as_ref()).unwrap_or("")
        )?;
        for parameter in &self.parameters {
            write!(f, " {parameter}")?;
        }
        f.write_str("\r\n")
    }
}

impl Mail {
    /// Creates a MAIL command
    pub fn new(sender: Option<Address>, parameters: Vec<MailParameter>) -> Mail {
        Mail { sender, parameters }
    }
}

/// RCPT command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Rcpt {
    recipient: Address,
}

impl Display for Rcpt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "RCPT TO:<{}>\r\n", self.recipient)
    }
}

impl Rcpt {
    /// Creates an RCPT command
    pub fn new(recipient: Address) -> Rcpt {
        Rcpt { recipient }
    }
}

/// DATA command
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Data;

impl Display for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("DATA\r\n")
    }
}

/// QUIT command
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Quit;

impl Display for Quit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("QUIT\r\n")
    }
}

/// NOOP command
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Noop;

impl Display for Noop {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("NOOP\r\n")
    }
}

/// AUTH command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Auth {
    mechanism: Mechanism,
    response: Option<String>,
}

impl Display for Auth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let encoded_response = self.response.as_ref().map(base64::encode);

        if self.mechanism.supports_initial_response() {
            write!(f, "AUTH {} {}", self.mechanism, encoded_response.unwrap())?;
        } else {
            match encoded_response {
                Some(response) => f.write_str(&response)?,
                None => write!(f, "AUTH {}", self.mechanism)?,
            }
        }
        f.write_str("\r\n")
    }
}

impl Auth {
    /// Creates an AUTH command (from a challenge if provided)
    pub fn new(
        mechanism: Mechanism,
        credentials: &Credentials,
        challenge: Option<&str>,
    ) -> Result<Auth, Error> {
        let response = if mechanism.supports_initial_response() || challenge.is_some() {
            Some(mechanism.response(credentials, challenge)?)
        } else {
            None
        };
        Ok(Auth {
            mechanism,
            response,
        })
    }

    /// Creates an AUTH command from a server response, which must be a
    /// challenge (code 334)
    pub fn new_from_response(
        mechanism: Mechanism,
        credentials: &Credentials,
        response: &Response,
    ) -> Result<Auth, Error> {
        if !response.has_code(334) {
            return Err(error::response("expecting a challenge"));
        }

        let encoded_challenge = response
            .first_word()
            .ok_or_else(|| error::response("could not read auth challenge"))?;

        let decoded_challenge = String::from_utf8(
            base64::decode(encoded_challenge).map_err(error::response)?,
        )
        .map_err(error::response)?;
        tracing::debug!(challenge = %decoded_challenge, "auth challenge");

        let auth_response = Some(mechanism.response(credentials, Some(&decoded_challenge))?);

        Ok(Auth {
            mechanism,
            response: auth_response,
        })
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::transport::smtp::extension::MailBodyParameter;

    #[test]
    fn command_display() {
        let id = ClientId::Domain("localhost".to_owned());
        let email = Address::from_str("test@example.com").unwrap();

        assert_eq!(Ehlo::new(id).to_string(), "EHLO localhost\r\n");
        assert_eq!(Starttls.to_string(), "STARTTLS\r\n");
        assert_eq!(
            Mail::new(Some(email.clone()), vec![]).to_string(),
            "MAIL FROM:<test@example.com>\r\n"
        );
        assert_eq!(Mail::new(None, vec![]).to_string(), "MAIL FROM:<>\r\n");
        assert_eq!(
            Mail::new(
                Some(email.clone()),
                vec![MailParameter::Body(MailBodyParameter::EightBitMime)],
            )
            .to_string(),
            "MAIL FROM:<test@example.com> BODY=8BITMIME\r\n"
        );
        assert_eq!(
            Rcpt::new(email).to_string(),
            "RCPT TO:<test@example.com>\r\n"
        );
        assert_eq!(Data.to_string(), "DATA\r\n");
        assert_eq!(Quit.to_string(), "QUIT\r\n");
        assert_eq!(Noop.to_string(), "NOOP\r\n");
    }

    #[test]
    fn auth_display() {
        let credentials = Credentials::new("user".to_owned(), "password".to_owned());

        assert_eq!(
            Auth::new(Mechanism::Plain, &credentials, None)
                .unwrap()
                .to_string(),
            "AUTH PLAIN AHVzZXIAcGFzc3dvcmQ=\r\n"
        );
        assert_eq!(
            Auth::new(Mechanism::Login, &credentials, None)
                .unwrap()
                .to_string(),
            "AUTH LOGIN\r\n"
        );
    }

    #[test]
    fn auth_login_challenge_round() {
        let credentials = Credentials::new("user".to_owned(), "password".to_owned());
        // "Username:" base64-encoded
        let challenge = "334 VXNlcm5hbWU6\r\n".parse::<Response>().unwrap();
        let auth = Auth::new_from_response(Mechanism::Login, &credentials, &challenge).unwrap();
        // "user" base64-encoded
        assert_eq!(auth.to_string(), "dXNlcg==\r\n");
    }

    #[test]
    fn auth_rejects_non_challenge_response() {
        let credentials = Credentials::new("user".to_owned(), "password".to_owned());
        let ok = "250 OK\r\n".parse::<Response>().unwrap();
        assert!(Auth::new_from_response(Mechanism::Login, &credentials, &ok).is_err());
    }
}
