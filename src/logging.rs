//! Logging setup: `tracing` + `tracing-subscriber`, the same stack the
//! reference crate already uses, pointed at an append-mode file sink so
//! every run also satisfies the standalone `proxy.log` contract.
//!
//! Records are timestamped and leveled by `tracing_subscriber`'s own
//! formatter; the mutex around the file handle guarantees one writer at a
//! time and (because `std::io::Write` on a `File` is unbuffered here) each
//! line is flushed to disk before the guard is dropped.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone)]
struct SharedFile(Arc<Mutex<File>>);

impl io::Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.0.lock().unwrap_or_else(|e| e.into_inner());
        let n = file.write(buf)?;
        file.flush()?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).flush()
    }
}

impl<'a> MakeWriter<'a> for SharedFile {
    type Writer = SharedFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Opens `log_path` in append mode and installs it as the global `tracing`
/// subscriber. Log-file open failure is a process-fatal condition (§7): the
/// caller is expected to print the error and exit rather than start serving
/// requests with no sink.
pub fn init(log_path: impl AsRef<Path>) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let writer = SharedFile(Arc::new(Mutex::new(file)));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(())
}
