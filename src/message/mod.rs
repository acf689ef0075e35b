//! Provides a way to build and render email messages
//!
//! ## Usage
//!
//! ### Plain body
//!
//! ```rust
//! use missive::Message;
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let message = Message::builder()
//!     .from("NoBody <nobody@domain.tld>".parse()?)
//!     .reply_to("Yuin <yuin@domain.tld>".parse()?)
//!     .to("Hei <hei@domain.tld>".parse()?)
//!     .subject("Happy new year")
//!     .body("Be happy!")?;
//!
//! let raw = message.formatted();
//! # Ok(())
//! # }
//! ```
//!
//! ### Attachments
//!
//! Attachments turn the rendered message into a `multipart/mixed` envelope.
//! They are keyed by filename: attaching a second file with the same name
//! replaces the first.
//!
//! ```rust,no_run
//! use missive::{Attachment, Message};
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let mut message = Message::builder()
//!     .from("nobody@domain.tld".parse()?)
//!     .to("hei@domain.tld".parse()?)
//!     .subject("Report")
//!     .attachment(Attachment::new("notes.txt", b"already in memory".to_vec()))
//!     .body("See attached.")?;
//!
//! // or read from disk after building
//! message.attach("reports/q3.pdf", false)?;
//! # Ok(())
//! # }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Utc};
use mime::Mime;

pub use self::{
    attachment::Attachment,
    mailbox::{Mailbox, Mailboxes},
};
use crate::{
    address::{validate_line, Envelope},
    error::Error,
};

mod attachment;
mod encoder;
mod mailbox;
mod utf8_b;

/// The three classes of message recipients.
///
/// Each non-empty class is delivered through its own SMTP transaction, with
/// an independently rendered copy of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipientClass {
    /// Primary recipients
    To,
    /// Carbon copy recipients
    Cc,
    /// Blind carbon copy recipients
    Bcc,
}

impl RecipientClass {
    /// All classes, in delivery order
    pub const ALL: [RecipientClass; 3] =
        [RecipientClass::To, RecipientClass::Cc, RecipientClass::Bcc];
}

impl Display for RecipientClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            RecipientClass::To => "To",
            RecipientClass::Cc => "Cc",
            RecipientClass::Bcc => "Bcc",
        })
    }
}

/// An email message: addressing headers, subject, plain body and
/// attachments.
///
/// Create one with [`Message::builder`]. Attachments can still be added
/// after building; everything else is fixed. Rendering with
/// [`Message::formatted`] is a pure function of the fields, except for the
/// multipart boundary token which is regenerated on every call.
#[derive(Debug, Clone)]
pub struct Message {
    from: Mailbox,
    to: Mailboxes,
    cc: Mailboxes,
    bcc: Mailboxes,
    reply_to: Option<Mailbox>,
    subject: String,
    body: String,
    content_type: Mime,
    date: Option<DateTime<Utc>>,
    attachments: Vec<Attachment>,
}

impl Message {
    /// Returns a new message builder, with no fields set.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// The sender mailbox.
    pub fn from(&self) -> &Mailbox {
        &self.from
    }

    /// Primary recipients.
    pub fn to(&self) -> &Mailboxes {
        &self.to
    }

    /// Carbon copy recipients.
    pub fn cc(&self) -> &Mailboxes {
        &self.cc
    }

    /// Blind carbon copy recipients.
    pub fn bcc(&self) -> &Mailboxes {
        &self.bcc
    }

    /// The Reply-To mailbox, if any.
    pub fn reply_to(&self) -> Option<&Mailbox> {
        self.reply_to.as_ref()
    }

    /// The message subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The plain body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Declared content type of the body.
    pub fn content_type(&self) -> &Mime {
        &self.content_type
    }

    /// Fixed date for the `Date` header, when one was set.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }

    /// The attachments, in insertion order.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Reads a file and attaches it, keyed by its base filename.
    pub fn attach<P: AsRef<std::path::Path>>(&mut self, path: P, inline: bool) -> Result<(), Error> {
        let attachment = Attachment::from_path(path, inline)?;
        self.push_attachment(attachment)
    }

    /// Attaches in-memory content, keyed by filename.
    pub fn attach_bytes<S: Into<String>>(
        &mut self,
        filename: S,
        content: Vec<u8>,
        inline: bool,
    ) -> Result<(), Error> {
        let filename = filename.into();
        let attachment = if inline {
            Attachment::new_inline(filename, content)
        } else {
            Attachment::new(filename, content)
        };
        self.push_attachment(attachment)
    }

    fn push_attachment(&mut self, attachment: Attachment) -> Result<(), Error> {
        validate_line(attachment.filename())?;
        match self
            .attachments
            .iter()
            .position(|a| a.filename() == attachment.filename())
        {
            // last attachment with a given filename wins
            Some(idx) => self.attachments[idx] = attachment,
            None => self.attachments.push(attachment),
        }
        Ok(())
    }

    /// Builds the SMTP envelope for one recipient class.
    ///
    /// Returns `Ok(None)` when the class has no recipient.
    pub fn envelope(&self, class: RecipientClass) -> Result<Option<Envelope>, Error> {
        let mailboxes = match class {
            RecipientClass::To => &self.to,
            RecipientClass::Cc => &self.cc,
            RecipientClass::Bcc => &self.bcc,
        };
        if mailboxes.is_empty() {
            return Ok(None);
        }
        Envelope::new(Some(self.from.email.clone()), mailboxes.addresses()).map(Some)
    }

    /// Renders the message into its final wire form: headers, a blank line,
    /// then the body.
    ///
    /// Two calls on the same message produce the same byte count but not
    /// identical bytes, as the multipart boundary is regenerated each time.
    pub fn formatted(&self) -> Vec<u8> {
        let mut out = encoder::render_headers(self).into_bytes();
        out.extend_from_slice(&encoder::render_body(self));
        out
    }
}

/// Builder for [`Message`]
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<Mailbox>,
    to: Mailboxes,
    cc: Mailboxes,
    bcc: Mailboxes,
    reply_to: Option<Mailbox>,
    subject: String,
    content_type: Option<Mime>,
    date: Option<DateTime<Utc>>,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    /// Creates a new builder, with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender mailbox. Required.
    pub fn from(mut self, from: Mailbox) -> Self {
        self.from = Some(from);
        self
    }

    /// Add a primary recipient.
    pub fn to(mut self, to: Mailbox) -> Self {
        self.to.push(to);
        self
    }

    /// Add a carbon copy recipient.
    pub fn cc(mut self, cc: Mailbox) -> Self {
        self.cc.push(cc);
        self
    }

    /// Add a blind carbon copy recipient.
    pub fn bcc(mut self, bcc: Mailbox) -> Self {
        self.bcc.push(bcc);
        self
    }

    /// Set the Reply-To mailbox.
    pub fn reply_to(mut self, reply_to: Mailbox) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Set the message subject.
    pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
        self.subject = subject.into();
        self
    }

    /// Declare the content type of the body. Defaults to `text/plain`.
    pub fn content_type(mut self, content_type: Mime) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Pin the `Date` header to a fixed instant instead of the build time.
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Add an attachment.
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Set the body text and finish the message.
    ///
    /// Fails with [`Error::MissingFrom`] when no sender was given,
    /// [`Error::MissingTo`] when no class holds a recipient, and
    /// [`Error::InvalidAddress`] when a display name, address or attachment
    /// filename contains CR or LF.
    pub fn body<S: Into<String>>(self, body: S) -> Result<Message, Error> {
        let from = self.from.ok_or(Error::MissingFrom)?;
        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(Error::MissingTo);
        }

        for mailbox in std::iter::once(&from)
            .chain(self.reply_to.iter())
            .chain(self.to.iter())
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
        {
            validate_line(mailbox.email.as_ref())?;
            if let Some(name) = &mailbox.name {
                validate_line(name)?;
            }
        }

        let mut message = Message {
            from,
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            reply_to: self.reply_to,
            subject: self.subject,
            body: body.into(),
            content_type: self.content_type.unwrap_or(mime::TEXT_PLAIN),
            date: self.date,
            attachments: Vec::new(),
        };
        for attachment in self.attachments {
            message.push_attachment(attachment)?;
        }
        Ok(message)
    }
}
