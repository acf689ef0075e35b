//! ### Sending messages
//!
//! A [`Transport`] delivers a rendered message. Two implementations are
//! provided:
//!
//! * [`SmtpTransport`][smtp::SmtpTransport] speaks the SMTP protocol over
//!   the network, optionally through TLS. This is the preferred way of
//!   sending emails.
//! * [`StubTransport`][stub::StubTransport] records envelopes and message
//!   bytes in memory, for tests and debugging.
//!
//! [`Transport::send`] delivers one SMTP transaction per non-empty
//! recipient class (To, Cc, Bcc). The message is re-rendered for every
//! class, so each copy carries its own multipart boundary, and classes are
//! attempted independently: a rejected Cc transaction does not prevent the
//! Bcc one. The outcome of every attempted class is returned in a
//! [`SendReport`], leaving the escalation policy to the caller.

use crate::{
    address::Envelope,
    error::Error as ContentError,
    message::{Message, RecipientClass},
};

pub mod smtp;
pub mod stub;

/// Blocking transport method for emails
pub trait Transport {
    /// Response produced by the transport
    type Ok;
    /// Error produced by the transport
    type Error: std::error::Error;

    /// Sends the message, one transaction per non-empty recipient class.
    ///
    /// Returns `Err` only for failures detected before any network I/O
    /// (invalid addresses, no recipients). Per-class protocol failures are
    /// reported inside the [`SendReport`] and logged, never escalated here,
    /// so one class cannot block the others.
    fn send(&self, message: &Message) -> Result<SendReport<Self::Ok, Self::Error>, ContentError>
    where
        Self: Sized,
    {
        // Build every envelope up front: address validation must abort the
        // whole send before the first connection is opened.
        let mut classes = Vec::new();
        for class in RecipientClass::ALL {
            if let Some(envelope) = message.envelope(class)? {
                classes.push((class, envelope));
            }
        }
        if classes.is_empty() {
            return Err(ContentError::MissingTo);
        }

        let mut deliveries = Vec::new();
        for (class, envelope) in classes {
            let raw = message.formatted();
            let result = self.send_raw(&envelope, &raw);
            if let Err(error) = &result {
                tracing::warn!(class = %class, %error, "class delivery failed");
            }
            deliveries.push(Delivery {
                class,
                recipients: envelope.to().len(),
                result,
            });
        }
        Ok(SendReport { deliveries })
    }

    /// Sends raw message bytes in a single transaction with the given
    /// envelope.
    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error>;
}

/// Outcome of one per-class SMTP transaction.
#[derive(Debug)]
pub struct Delivery<O, E> {
    class: RecipientClass,
    recipients: usize,
    result: Result<O, E>,
}

impl<O, E> Delivery<O, E> {
    /// The recipient class this transaction covered.
    pub fn class(&self) -> RecipientClass {
        self.class
    }

    /// Number of envelope recipients in this transaction.
    pub fn recipients(&self) -> usize {
        self.recipients
    }

    /// The transaction outcome.
    pub fn result(&self) -> Result<&O, &E> {
        self.result.as_ref()
    }

    /// Whether the transaction succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-class outcomes of a [`Transport::send`] call.
#[derive(Debug)]
pub struct SendReport<O, E> {
    deliveries: Vec<Delivery<O, E>>,
}

impl<O, E> SendReport<O, E> {
    /// All attempted deliveries, in class order.
    pub fn deliveries(&self) -> &[Delivery<O, E>] {
        &self.deliveries
    }

    /// Whether every attempted class was delivered.
    pub fn is_success(&self) -> bool {
        self.deliveries.iter().all(Delivery::is_ok)
    }

    /// The first per-class error, if any.
    pub fn first_error(&self) -> Option<&E> {
        self.deliveries
            .iter()
            .find_map(|delivery| delivery.result().err())
    }
}

impl<O, E> IntoIterator for SendReport<O, E> {
    type Item = Delivery<O, E>;
    type IntoIter = std::vec::IntoIter<Delivery<O, E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.deliveries.into_iter()
    }
}
