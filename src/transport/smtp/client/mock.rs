//! In-memory stream with scripted reads, for driving the client without a
//! network

use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

type MockCursor = Cursor<Vec<u8>>;

/// A readable/writable stream backed by two in-memory buffers
#[derive(Clone, Debug, Default)]
pub struct MockStream {
    reader: Arc<Mutex<MockCursor>>,
    writer: Arc<Mutex<MockCursor>>,
}

impl MockStream {
    /// Creates an empty mock stream
    pub fn new() -> MockStream {
        MockStream::default()
    }

    /// Creates a mock stream whose reads will produce `vec`
    pub fn with_vec(vec: Vec<u8>) -> MockStream {
        MockStream {
            reader: Arc::new(Mutex::new(MockCursor::new(vec))),
            writer: Arc::new(Mutex::new(MockCursor::new(Vec::new()))),
        }
    }

    /// Takes everything written so far, clearing the write buffer
    pub fn take_vec(&mut self) -> Vec<u8> {
        let mut cursor = self.writer.lock().unwrap();
        let vec = cursor.get_ref().clone();
        cursor.set_position(0);
        cursor.get_mut().clear();
        vec
    }

    /// Replaces the pending read data
    pub fn next_vec(&mut self, vec: &[u8]) {
        let mut cursor = self.reader.lock().unwrap();
        cursor.set_position(0);
        cursor.get_mut().clear();
        cursor.get_mut().extend_from_slice(vec);
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.lock().unwrap().flush()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.lock().unwrap().read(buf)
    }
}
