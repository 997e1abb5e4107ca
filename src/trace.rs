//! Reading text logs from disk.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::*;

/// A line-oriented view of a log.
///
/// Lines are decoded lossily so that a stray non-UTF-8 byte in a simulator
/// printf only spoils that one line. If reading fails part-way through, the
/// iterator ends early and the error is returned by [LogReader::finish].
pub struct LogReader<R> {
    reader: R,
    path: PathBuf,
    buf: Vec<u8>,
    error: Option<std::io::Error>,
}

impl LogReader<BufReader<File>> {
    /// Open a log file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening log");
        let f = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(f), path))
    }
}

impl<R: BufRead> LogReader<R> {
    /// Wrap some other source of lines. `path` is only used for errors.
    pub fn from_reader(reader: R, path: impl AsRef<Path>) -> Self {
        Self {
            reader,
            path: path.as_ref().to_path_buf(),
            buf: Vec::new(),
            error: None,
        }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Consume the reader, surfacing any I/O error hit while iterating.
    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(source) => Err(Error::Read { path: self.path, source }),
            None => Ok(()),
        }
    }
}

impl<R: BufRead> Iterator for LogReader<R> {
    type Item = String;
    fn next(&mut self) -> Option<String> {
        if self.error.is_some() {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                while matches!(self.buf.last(), Some(b'\n') | Some(b'\r')) {
                    self.buf.pop();
                }
                Some(String::from_utf8_lossy(&self.buf).into_owned())
            },
            Err(e) => {
                self.error = Some(e);
                None
            },
        }
    }
}
