//! Output sinks for the synthetic `out` name.
//!
//! Output is directed per evaluation call:
//! - Stdout: the default for the CLI
//! - Buffer: captured for tests and embedders
//! - Silent: discarded
//! - Writer: any `std::io::Write` supplied by the caller

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

enum SinkImpl {
    Stdout,
    Buffer(Mutex<String>),
    Silent,
    Writer(Mutex<Box<dyn Write + Send>>),
}

/// Append-only character sink, cheap to clone.
#[derive(Clone)]
pub struct OutputSink(Arc<SinkImpl>);

impl OutputSink {
    pub fn stdout() -> Self {
        OutputSink(Arc::new(SinkImpl::Stdout))
    }

    pub fn buffer() -> Self {
        OutputSink(Arc::new(SinkImpl::Buffer(Mutex::new(String::new()))))
    }

    pub fn silent() -> Self {
        OutputSink(Arc::new(SinkImpl::Silent))
    }

    pub fn writer(writer: impl Write + Send + 'static) -> Self {
        OutputSink(Arc::new(SinkImpl::Writer(Mutex::new(Box::new(writer)))))
    }

    /// Write without a trailing newline.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        match &*self.0 {
            SinkImpl::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(msg.as_bytes())?;
                out.flush()
            }
            SinkImpl::Buffer(buf) => {
                buf.lock().push_str(msg);
                Ok(())
            }
            SinkImpl::Silent => Ok(()),
            SinkImpl::Writer(w) => w.lock().write_all(msg.as_bytes()),
        }
    }

    /// Write a line.
    pub fn println(&self, msg: &str) -> io::Result<()> {
        match &*self.0 {
            SinkImpl::Buffer(buf) => {
                let mut buf = buf.lock();
                buf.push_str(msg);
                buf.push('\n');
                Ok(())
            }
            _ => {
                self.print(msg)?;
                self.print("\n")
            }
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        match &*self.0 {
            SinkImpl::Stdout => io::stdout().flush(),
            SinkImpl::Writer(w) => w.lock().flush(),
            SinkImpl::Buffer(_) | SinkImpl::Silent => Ok(()),
        }
    }

    /// Everything captured so far. Empty for sinks that do not capture.
    pub fn get_output(&self) -> String {
        match &*self.0 {
            SinkImpl::Buffer(buf) => buf.lock().clone(),
            _ => String::new(),
        }
    }

    pub fn clear(&self) {
        if let SinkImpl::Buffer(buf) = &*self.0 {
            buf.lock().clear();
        }
    }

    pub fn ptr_eq(&self, other: &OutputSink) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        OutputSink::stdout()
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.0 {
            SinkImpl::Stdout => "Stdout",
            SinkImpl::Buffer(_) => "Buffer",
            SinkImpl::Silent => "Silent",
            SinkImpl::Writer(_) => "Writer",
        };
        write!(f, "OutputSink::{kind}")
    }
}
