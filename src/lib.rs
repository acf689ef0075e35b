//! # missive
//!
//! `missive` builds email messages and sends them over SMTP.
//!
//! It provides two pieces, used in sequence:
//!
//! * a **message builder**, turning sender, recipients, subject, body and
//!   attachments into an RFC 5322/2045 compliant byte sequence
//!   (`multipart/mixed` when attachments are present);
//! * an **SMTP transport**, delivering those bytes to a relay server,
//!   optionally over TLS (wrapped or via `STARTTLS`) and with PLAIN/LOGIN
//!   authentication.
//!
//! Delivery is performed once per non-empty recipient class (To, Cc, Bcc):
//! each class gets its own SMTP transaction with an independently rendered
//! copy of the message, and the per-class outcomes are collected in a
//! [`SendReport`] so one failing class never blocks the others.
//!
//! ## Example
//!
//! ```rust,no_run
//! use missive::{Message, SmtpTransport, Transport};
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let mut message = Message::builder()
//!     .from("NoBody <nobody@domain.tld>".parse()?)
//!     .reply_to("Yuin <yuin@domain.tld>".parse()?)
//!     .to("Hei <hei@domain.tld>".parse()?)
//!     .cc("archive@domain.tld".parse()?)
//!     .subject("Happy new year")
//!     .body("Be happy!")?;
//! message.attach("fireworks.png", false)?;
//!
//! let mailer = SmtpTransport::relay("smtp.domain.tld")?.build();
//!
//! let report = mailer.send(&message)?;
//! for delivery in report.deliveries() {
//!     println!("{}: {:?}", delivery.class(), delivery.result().map(|_| "sent"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Everything is synchronous and connections are not reused: every
//! transaction opens, uses and closes its own socket.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod address;
mod base64;
mod error;
pub mod message;
pub mod transport;

pub use crate::{
    address::{Address, Envelope},
    error::Error,
    message::{Attachment, Mailbox, Mailboxes, Message, MessageBuilder, RecipientClass},
    transport::{smtp::SmtpTransport, Delivery, SendReport, Transport},
};

/// Type alias for boxed errors used as sources
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
