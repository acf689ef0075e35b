use super::Address;
use crate::error::Error;

/// Checks that a value is safe to place on an SMTP command line, as per
/// RFC 5321: it must not contain CR or LF.
pub(crate) fn validate_line(line: &str) -> Result<(), Error> {
    if line.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(Error::InvalidAddress);
    }
    Ok(())
}

/// Simple email envelope representation
///
/// Carries the sender and recipients of one SMTP transaction. We only accept
/// mailbox addresses, and do not support source routes (as per RFC).
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Envelope {
    /// The envelope recipients' addresses
    ///
    /// This can not be empty.
    forward_path: Vec<Address>,
    /// The envelope sender address
    reverse_path: Option<Address>,
}

impl Envelope {
    /// Creates a new envelope, which may fail if `to` is empty or if any
    /// address contains a CR or LF byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::str::FromStr;
    /// # use missive::{Address, Envelope};
    ///
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// let sender = Address::from_str("from@email.com")?;
    /// let recipients = vec![Address::from_str("to@email.com")?];
    ///
    /// let envelope = Envelope::new(Some(sender), recipients)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(from: Option<Address>, to: Vec<Address>) -> Result<Envelope, Error> {
        if to.is_empty() {
            return Err(Error::MissingTo);
        }
        if let Some(from) = &from {
            validate_line(from.as_ref())?;
        }
        for recipient in &to {
            validate_line(recipient.as_ref())?;
        }
        Ok(Envelope {
            forward_path: to,
            reverse_path: from,
        })
    }

    /// Gets the destination addresses of the envelope.
    pub fn to(&self) -> &[Address] {
        self.forward_path.as_slice()
    }

    /// Gets the sender of the envelope.
    pub fn from(&self) -> Option<&Address> {
        self.reverse_path.as_ref()
    }

    /// Whether any envelope address needs the SMTPUTF8 extension
    pub(crate) fn has_non_ascii_addresses(&self) -> bool {
        self.reverse_path
            .iter()
            .chain(self.forward_path.iter())
            .any(|a| !a.is_ascii())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn requires_at_least_one_recipient() {
        let from = Address::from_str("from@example.com").unwrap();
        assert!(matches!(
            Envelope::new(Some(from), vec![]),
            Err(Error::MissingTo)
        ));
    }

    #[test]
    fn validate_line_rejects_cr_and_lf() {
        assert!(validate_line("user@example.com").is_ok());
        assert!(validate_line("Test User").is_ok());
        assert!(validate_line("").is_ok());
        assert!(validate_line("user@example.com\r").is_err());
        assert!(validate_line("user@example.com\n").is_err());
        assert!(validate_line("a\r\nRCPT TO:<evil@example.com>").is_err());
    }

    #[test]
    fn sender_is_optional() {
        let to = vec![Address::from_str("to@example.com").unwrap()];
        let envelope = Envelope::new(None, to).unwrap();
        assert!(envelope.from().is_none());
        assert_eq!(envelope.to().len(), 1);
    }
}
