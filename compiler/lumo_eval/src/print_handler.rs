//! Output binding for `print` and `println`.
//!
//! Each context owns one handler. Hosts choose where script output goes:
//! the process stdout, a capture buffer (tests and embedders that render
//! output themselves), or nowhere.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Destination for script output, dispatched by enum rather than trait
/// object since the set of sinks is closed.
pub enum PrintHandler {
    Stdout,
    Buffer(Mutex<String>),
    Silent,
}

/// Handler shared between a context and the interpreters it spawns.
pub type SharedPrintHandler = Arc<PrintHandler>;

impl PrintHandler {
    /// Write `text` verbatim; newlines are the caller's business.
    pub fn write(&self, text: &str) {
        match self {
            PrintHandler::Stdout => {
                let mut out = std::io::stdout().lock();
                // A closed stdout is not a script failure.
                let _ = out.write_all(text.as_bytes());
                let _ = out.flush();
            }
            PrintHandler::Buffer(buf) => buf.lock().push_str(text),
            PrintHandler::Silent => {}
        }
    }

    /// Everything captured so far. Empty for non-capturing handlers.
    pub fn output(&self) -> String {
        match self {
            PrintHandler::Buffer(buf) => buf.lock().clone(),
            PrintHandler::Stdout | PrintHandler::Silent => String::new(),
        }
    }

    /// Return and clear the captured output.
    pub fn take_output(&self) -> String {
        match self {
            PrintHandler::Buffer(buf) => std::mem::take(&mut *buf.lock()),
            PrintHandler::Stdout | PrintHandler::Silent => String::new(),
        }
    }
}

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Stdout)
}

/// A capturing handler; read it back with `output()`.
pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Buffer(Mutex::new(String::new())))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Silent)
}
