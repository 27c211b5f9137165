use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::{debug, Level};

/// Collects log output while the terminal belongs to the TUI.
#[derive(Clone, Default)]
pub struct LogBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    pub fn contents(&self) -> String {
        match self.inner.lock() {
            Ok(buffer) => String::from_utf8_lossy(&buffer).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Installs the global subscriber. With `debug` set, events are kept in the
/// returned buffer; otherwise they are discarded. A subscriber that is already
/// installed stays in place.
pub fn init(debug: bool) -> Option<LogBuffer> {
    let (installed, buffer) = if debug {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let installed = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_target(false)
            .with_writer(move || writer.clone())
            .try_init();
        (installed, Some(buffer))
    } else {
        let installed = tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_writer(io::sink)
            .try_init();
        (installed, None)
    };

    if let Err(err) = installed {
        debug!(error = %err, "keeping existing subscriber");
    }
    buffer
}
