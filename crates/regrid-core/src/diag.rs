//! Diagnostic log for rejected requests.
//!
//! The allocator, store and cell-set layers never abort on a bad request.
//! They return an error and append a line to an [`ErrorLog`], which the
//! caller drains at its leisure. Every record is also forwarded to the
//! `log` facade at `warn` level.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared, append-only buffer of diagnostic messages.
///
/// Cloning an `ErrorLog` yields another handle to the same buffer, so one
/// log can be threaded through an allocator and every cell set built on
/// it. Messages are kept until [`drain`](Self::drain) is called.
#[derive(Clone, Default)]
pub struct ErrorLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ErrorLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message tagged with the component that produced it.
    pub fn record(&self, component: &str, message: impl fmt::Display) {
        let line = format!("{component}: {message}");
        log::warn!("{line}");
        self.lock().push(line);
    }

    /// Remove and return every accumulated message, oldest first.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of messages waiting to be drained.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the log holds no messages.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether `other` is a handle to the same buffer.
    pub fn shares_buffer(&self, other: &ErrorLog) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // A panic while holding the lock cannot leave a Vec<String> torn.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorLog")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_then_drain() {
        let log = ErrorLog::new();
        log.record("arena", "out of memory");
        log.record("store", format_args!("slot {} occupied", 4));
        assert_eq!(log.len(), 2);
        let lines = log.drain();
        assert_eq!(lines, vec!["arena: out of memory", "store: slot 4 occupied"]);
        assert!(log.is_empty());
    }

    #[test]
    fn clones_share_buffer() {
        let a = ErrorLog::new();
        let b = a.clone();
        b.record("cells", "double free");
        assert!(a.shares_buffer(&b));
        assert_eq!(a.drain().len(), 1);
        assert!(b.is_empty());
    }

    #[test]
    fn independent_logs_do_not_share() {
        let a = ErrorLog::new();
        let b = ErrorLog::new();
        assert!(!a.shares_buffer(&b));
    }
}
