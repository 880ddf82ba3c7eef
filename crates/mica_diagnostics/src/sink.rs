//! Thread-safe diagnostic accumulator for parallel compilation.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A thread-safe accumulator for diagnostics emitted during a build.
///
/// Compiler workers emit warnings concurrently via [`emit`](Self::emit).
/// The error count is tracked atomically so `has_errors` does not lock
/// the diagnostic vector.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
        }
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity == Severity::Error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        let mut diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.push(diag);
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.lock().unwrap();
        std::mem::take(&mut *diagnostics)
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn warnings_are_not_errors() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::warning("/p/a.mica", 1, "unused"));
        assert!(!sink.has_errors());
        assert_eq!(sink.take_all().len(), 1);
    }

    #[test]
    fn errors_are_counted() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::error("/p/a.mica", 1, "boom"));
        assert!(sink.has_errors());
    }

    #[test]
    fn take_all_drains() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::warning("/p/a.mica", 1, "w"));
        sink.emit(Diagnostic::error("/p/b.mica", 2, "e"));
        assert_eq!(sink.take_all().len(), 2);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn concurrent_emits() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let mut handles = Vec::new();

        for n in 0..8 {
            let sink = Arc::clone(&sink);
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    sink.emit(Diagnostic::warning(
                        format!("/p/{n}.mica"),
                        i,
                        "concurrent warning",
                    ));
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(sink.take_all().len(), 400);
        assert!(!sink.has_errors());
    }
}
