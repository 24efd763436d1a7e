//! JSON-lines event reader.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use pfcluster_core::EventRecords;

use crate::{Error, Result};

/// Streams events from a JSON-lines source.
///
/// Blank lines and lines starting with `#` are skipped.
pub struct EventReader<R> {
    reader: R,
    line: usize,
    buffer: String,
}

impl EventReader<BufReader<File>> {
    /// Opens an event file.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> EventReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }

    /// Number of lines consumed so far.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<EventRecords>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(err) => return Some(Err(err.into())),
            }
            let text = self.buffer.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            return Some(
                serde_json::from_str(text).map_err(|err| Error::InvalidFormat {
                    line: self.line,
                    message: err.to_string(),
                }),
            );
        }
    }
}

/// Reads all events of a file.
///
/// # Errors
/// Fails on the first unreadable or malformed event.
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<EventRecords>> {
    EventReader::open(path)?.collect()
}
