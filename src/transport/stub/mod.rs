//! The stub transport keeps sent envelopes and message bytes in memory. It
//! can be useful for testing purposes.

use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
    sync::{Arc, Mutex},
};

use crate::{address::Envelope, transport::Transport};

/// The error returned by a failing [`StubTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StubError;

impl Display for StubError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("stub error")
    }
}

impl StdError for StubError {}

/// A transport that records every transaction and returns a fixed response
#[derive(Debug, Clone, Default)]
pub struct StubTransport {
    fail: bool,
    messages: Arc<Mutex<Vec<(Envelope, Vec<u8>)>>>,
}

impl StubTransport {
    /// Creates a transport that accepts every transaction
    pub fn new_positive() -> StubTransport {
        StubTransport {
            fail: false,
            messages: Arc::default(),
        }
    }

    /// Creates a transport that rejects every transaction
    pub fn new_error() -> StubTransport {
        StubTransport {
            fail: true,
            messages: Arc::default(),
        }
    }

    /// The recorded transactions, in send order.
    pub fn messages(&self) -> Vec<(Envelope, Vec<u8>)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Transport for StubTransport {
    type Ok = ();
    type Error = StubError;

    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error> {
        self.messages
            .lock()
            .unwrap()
            .push((envelope.clone(), email.to_vec()));
        if self.fail {
            Err(StubError)
        } else {
            Ok(())
        }
    }
}
