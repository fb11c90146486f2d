//! Where the optimizer reports human-readable status. Progress lines are meant for
//! the caller; debug lines describe search internals and are usually dropped.

pub trait ProgressSink {
    fn progress(&mut self, message: &str);

    fn debug(&mut self, _message: &str) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn progress(&mut self, _message: &str) {}
}

/// Writes progress (and optionally debug) lines to stderr, for the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink {
    pub debug: bool,
}

impl ProgressSink for StderrSink {
    fn progress(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn debug(&mut self, message: &str) {
        if self.debug {
            eprintln!("debug: {message}");
        }
    }
}

/// Adapts a closure into a progress sink. Debug lines are dropped.
pub struct FnSink<F>(pub F);

impl<F: FnMut(&str)> ProgressSink for FnSink<F> {
    fn progress(&mut self, message: &str) {
        (self.0)(message)
    }
}

/// Keeps every progress line; handy in tests.
impl ProgressSink for Vec<String> {
    fn progress(&mut self, message: &str) {
        self.push(message.to_string());
    }
}
