//! Error sink used by the provisioning session.
//!
//! Non-fatal problems (duplicate registrations, a broken grammar file inside a
//! directory) are reported here and processing continues. Fatal reports
//! precede a structured [`FactoryError`](crate::FactoryError) returned to the
//! caller.

use log::error;
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

pub trait ErrorHandler {
    fn error(&self, message: &str);

    fn fatal_error(&self, message: &str);

    /// Redirect diagnostic output to `path`. Sinks without a file target
    /// ignore this.
    fn set_log_target(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// Default sink: forwards reports to the `log` facade and, once a log target
/// is set, also appends them to that file.
#[derive(Debug, Default)]
pub struct LogErrorHandler {
    target: RefCell<Option<File>>,
}

impl LogErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&self, level: &str, message: &str) {
        if let Some(file) = self.target.borrow_mut().as_mut() {
            // Reporting never fails.
            let _ = writeln!(file, "[{level}] {message}");
        }
    }
}

impl ErrorHandler for LogErrorHandler {
    fn error(&self, message: &str) {
        error!(fatal = false; "{message}");
        self.append("error", message);
    }

    fn fatal_error(&self, message: &str) {
        error!(fatal = true; "{message}");
        self.append("fatal", message);
    }

    fn set_log_target(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        *self.target.borrow_mut() = Some(file);
        Ok(())
    }
}

/// Sink that discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullErrorHandler;

impl ErrorHandler for NullErrorHandler {
    fn error(&self, _message: &str) {}

    fn fatal_error(&self, _message: &str) {}
}

/// Severity of a captured report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Fatal,
}

/// Sink that keeps every report in memory; handy for tests and embedders that
/// surface diagnostics in their own UI.
#[derive(Debug, Default)]
pub struct RecordingErrorHandler {
    reports: RefCell<Vec<(Severity, String)>>,
}

impl RecordingErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(Severity, String)> {
        self.reports.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(Severity::Error)
    }

    pub fn fatal_errors(&self) -> Vec<String> {
        self.messages(Severity::Fatal)
    }

    fn messages(&self, severity: Severity) -> Vec<String> {
        self.reports
            .borrow()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl ErrorHandler for RecordingErrorHandler {
    fn error(&self, message: &str) {
        self.reports
            .borrow_mut()
            .push((Severity::Error, message.to_string()));
    }

    fn fatal_error(&self, message: &str) {
        self.reports
            .borrow_mut()
            .push((Severity::Fatal, message.to_string()));
    }
}

impl<T: ErrorHandler + ?Sized> ErrorHandler for std::rc::Rc<T> {
    fn error(&self, message: &str) {
        (**self).error(message)
    }

    fn fatal_error(&self, message: &str) {
        (**self).fatal_error(message)
    }

    fn set_log_target(&self, path: &Path) -> io::Result<()> {
        (**self).set_log_target(path)
    }
}
