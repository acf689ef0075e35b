use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
};

/// Error type for message content
#[derive(Debug)]
pub enum Error {
    /// Missing sender address
    MissingFrom,
    /// No recipient in any of To, Cc or Bcc
    MissingTo,
    /// An address or display name contains CR or LF
    InvalidAddress,
    /// Cannot parse filename for attachment
    CannotParseFilename,
    /// IO error while reading an attachment
    Io(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::MissingFrom => f.write_str("missing source address, invalid envelope"),
            Error::MissingTo => f.write_str("missing destination address, invalid envelope"),
            Error::InvalidAddress => f.write_str("address must not contain CR or LF"),
            Error::CannotParseFilename => f.write_str("could not parse attachment filename"),
            Error::Io(e) => e.fmt(f),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}
