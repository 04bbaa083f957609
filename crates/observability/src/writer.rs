//! Append-only JSONL file writer.
//!
//! Every write is flushed immediately so lines from several processes
//! interleave whole rather than torn.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Shared handle to the log file, opened in append mode.
#[derive(Clone)]
pub struct AppendLogWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl AppendLogWriter {
    /// Open (and create if needed) the log file, including parent directories.
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl Write for AppendLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// `MakeWriter` adapter handing out clones of one [`AppendLogWriter`].
#[derive(Clone)]
pub struct WriterFactory {
    writer: AppendLogWriter,
}

impl WriterFactory {
    pub fn new(writer: AppendLogWriter) -> Self {
        Self { writer }
    }
}

impl<'a> MakeWriter<'a> for WriterFactory {
    type Writer = AppendLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}
