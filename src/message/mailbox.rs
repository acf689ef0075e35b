use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    slice::Iter,
    str::FromStr,
};

use crate::address::{Address, AddressError};

/// Represents an email address with an optional name for the sender/recipient.
///
/// This type contains the email address and the sender/recipient name
/// (_Some Name \<user@domain.tld\>_ or _withoutname@domain.tld_).
///
/// # Examples
///
/// ```
/// # use missive::{Address, Mailbox};
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let address = Address::new("example", "email.com")?;
/// let mailbox = Mailbox::new(None, address);
///
/// let parsed: Mailbox = "John Smith <example@email.com>".parse()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Mailbox {
    /// The name associated with the address.
    pub name: Option<String>,

    /// The email address itself.
    pub email: Address,
}

impl Mailbox {
    /// Creates a new `Mailbox` using an email address and the name of the
    /// recipient if there is one.
    pub fn new(name: Option<String>, email: Address) -> Self {
        Mailbox { name, email }
    }
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if let Some(name) = &self.name {
            let name = name.trim();
            if !name.is_empty() {
                f.write_str(name)?;
                f.write_str(" <")?;
                self.email.fmt(f)?;
                return f.write_str(">");
            }
        }
        self.email.fmt(f)
    }
}

impl<S: Into<String>, T: Into<String>> TryFrom<(S, T)> for Mailbox {
    type Error = AddressError;

    fn try_from((name, address): (S, T)) -> Result<Self, Self::Error> {
        Ok(Mailbox::new(Some(name.into()), address.into().parse()?))
    }
}

impl FromStr for Mailbox {
    type Err = AddressError;

    fn from_str(src: &str) -> Result<Mailbox, Self::Err> {
        match (src.find('<'), src.rfind('>')) {
            (Some(open), Some(close)) if open < close && close == src.len() - 1 => {
                let name = src[..open].trim().trim_matches('"').trim();
                let name = if name.is_empty() {
                    None
                } else {
                    Some(name.to_owned())
                };
                let email = src[open + 1..close].trim().parse()?;
                Ok(Mailbox::new(name, email))
            }
            (None, None) => Ok(Mailbox::new(None, src.trim().parse()?)),
            _ => Err(AddressError::InvalidInput),
        }
    }
}

impl From<Address> for Mailbox {
    fn from(email: Address) -> Self {
        Mailbox::new(None, email)
    }
}

/// Represents a sequence of [`Mailbox`] instances.
///
/// Rendered in headers as a comma-joined list
/// (_Some Name \<user@domain.tld\>,other@domain.tld,..._).
#[derive(Debug, Clone, Default, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Mailboxes(Vec<Mailbox>);

impl Mailboxes {
    /// Creates a new empty list of [`Mailbox`] instances.
    pub fn new() -> Self {
        Mailboxes(Vec::new())
    }

    /// Adds a new [`Mailbox`] to the list, in a builder style pattern.
    pub fn with(mut self, mbox: Mailbox) -> Self {
        self.0.push(mbox);
        self
    }

    /// Adds a new [`Mailbox`] to the list.
    pub fn push(&mut self, mbox: Mailbox) {
        self.0.push(mbox);
    }

    /// Whether the list holds no mailbox.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of mailboxes in the list.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Creates an iterator over the stored [`Mailbox`] instances.
    pub fn iter(&self) -> Iter<'_, Mailbox> {
        self.0.iter()
    }

    /// The bare addresses of every mailbox in the list.
    pub(crate) fn addresses(&self) -> Vec<Address> {
        self.0.iter().map(|mbox| mbox.email.clone()).collect()
    }
}

impl Display for Mailboxes {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut first = true;
        for mbox in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            mbox.fmt(f)?;
        }
        Ok(())
    }
}

impl From<Mailbox> for Mailboxes {
    fn from(mbox: Mailbox) -> Self {
        Mailboxes(vec![mbox])
    }
}

impl FromIterator<Mailbox> for Mailboxes {
    fn from_iter<T: IntoIterator<Item = Mailbox>>(iter: T) -> Self {
        Mailboxes(iter.into_iter().collect())
    }
}

impl IntoIterator for Mailboxes {
    type Item = Mailbox;
    type IntoIter = std::vec::IntoIter<Mailbox>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn named_mailbox_display() {
        let mbox: Mailbox = ("Test User", "test.user@example.com").try_into().unwrap();
        assert_eq!(mbox.to_string(), "Test User <test.user@example.com>");
    }

    #[test]
    fn unnamed_mailbox_display_has_no_angle_brackets() {
        let mbox = Mailbox::new(None, "test.user@example.com".parse().unwrap());
        assert_eq!(mbox.to_string(), "test.user@example.com");

        let empty_name: Mailbox = ("", "test.user@example.com").try_into().unwrap();
        assert_eq!(empty_name.to_string(), "test.user@example.com");
    }

    #[test]
    fn mailboxes_join_with_single_comma() {
        let list = Mailboxes::new()
            .with(("Test User", "test.user@example.com").try_into().unwrap())
            .with(Mailbox::new(None, "other@example.com".parse().unwrap()));
        assert_eq!(
            list.to_string(),
            "Test User <test.user@example.com>,other@example.com"
        );
    }

    #[test]
    fn parse_angle_addr() {
        let mbox: Mailbox = "John Smith <example@email.com>".parse().unwrap();
        assert_eq!(mbox.name.as_deref(), Some("John Smith"));
        assert_eq!(mbox.email.to_string(), "example@email.com");

        let bare: Mailbox = "example@email.com".parse().unwrap();
        assert_eq!(bare.name, None);

        let bracket_only: Mailbox = "<example@email.com>".parse().unwrap();
        assert_eq!(bracket_only.name, None);
        assert_eq!(bracket_only.email.to_string(), "example@email.com");
    }

    #[test]
    fn parse_rejects_unbalanced_brackets() {
        assert!("John <example@email.com".parse::<Mailbox>().is_err());
        assert!("example@email.com>".parse::<Mailbox>().is_err());
    }
}
