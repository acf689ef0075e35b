use std::{fs, path::Path};

use mime::Mime;

use crate::error::Error;

/// A file attached to a [`Message`][super::Message].
///
/// Attachments are keyed by filename inside a message: adding a second
/// attachment with the same filename replaces the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    filename: String,
    content: Vec<u8>,
    inline: bool,
}

impl Attachment {
    /// Creates an attachment from in-memory content, rendered as a regular
    /// `Content-Disposition: attachment` part.
    pub fn new<S: Into<String>>(filename: S, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
            inline: false,
        }
    }

    /// Creates an inline attachment, rendered as a raw `message/rfc822` part.
    pub fn new_inline<S: Into<String>>(filename: S, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
            inline: true,
        }
    }

    /// Reads a file into an attachment, keyed by its base filename.
    ///
    /// This is the only filesystem access the crate performs.
    pub fn from_path<P: AsRef<Path>>(path: P, inline: bool) -> Result<Self, Error> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or(Error::CannotParseFilename)?
            .to_owned();
        let content = fs::read(path)?;
        Ok(Self {
            filename,
            content,
            inline,
        })
    }

    /// The filename the attachment is keyed by.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The raw attachment bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Whether the attachment is rendered inline.
    pub fn is_inline(&self) -> bool {
        self.inline
    }

    /// Content type for the part headers, looked up from the filename
    /// extension.
    pub(crate) fn content_type(&self) -> Mime {
        mime_guess::from_path(&self.filename).first_or_octet_stream()
    }
}
