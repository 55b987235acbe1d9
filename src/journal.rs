//! Injectable log sink shared by the listener and every worker.
//!
//! A [`Journal`] is a cheap, cloneable handle around a `Fn(Level, &str)`.
//! The default journal forwards to the [`log`] facade, so whichever logger
//! the binary installs (env_logger) decides formatting and filtering.
//! Tests swap in [`Journal::capture`] to assert on what was recorded.
//!
//! ```rust
//! use feanta_bridge::Journal;
//!
//! let (journal, entries) = Journal::capture();
//! journal.warn("Unrecognized command received: FOO.");
//!
//! let entries = entries.lock().unwrap();
//! assert_eq!(entries.len(), 1);
//! assert!(entries[0].1.contains("FOO"));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

pub use log::Level;

type Sink = dyn Fn(Level, &str) + Send + Sync;

/// Recorded entries of a capturing journal.
pub type CapturedEntries = Arc<Mutex<Vec<(Level, String)>>>;

/// Log target used when forwarding to the `log` facade.
pub const LOG_TARGET: &str = "feanta_bridge";

/// Cloneable logging handle injected into workers.
#[derive(Clone)]
pub struct Journal {
    sink: Arc<Sink>,
}

impl Journal {
    /// Create a journal from an arbitrary sink.
    pub fn new(sink: impl Fn(Level, &str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Journal that records every entry in memory.
    pub fn capture() -> (Self, CapturedEntries) {
        let entries: CapturedEntries = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&entries);
        let journal = Self::new(move |level, message| {
            if let Ok(mut guard) = store.lock() {
                guard.push((level, message.to_string()));
            }
        });
        (journal, entries)
    }

    /// Journal that drops everything.
    pub fn silent() -> Self {
        Self::new(|_, _| {})
    }

    /// Record an entry at the given level.
    pub fn log(&self, level: Level, message: &str) {
        (self.sink)(level, message);
    }

    /// Record an info entry.
    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    /// Record a warning.
    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    /// Record an error.
    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new(|level, message| log::log!(target: LOG_TARGET, level, "{}", message))
    }
}

impl fmt::Debug for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Journal").finish_non_exhaustive()
    }
}
