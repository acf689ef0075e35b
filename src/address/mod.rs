//! Email addresses and SMTP envelopes

pub use self::{
    envelope::Envelope,
    types::{Address, AddressError},
};

pub(crate) use self::envelope::validate_line;

mod envelope;
mod types;
