//! Diagnostic sinks injected into the CPU and the memory bus.
//!
//! The core never prints. Warnings (stray memory accesses) and per-instruction
//! trace records are handed to a [`DiagnosticSink`]; what happens to them is
//! up to whoever built the machine.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::cpu::trace::TraceRecord;

pub trait DiagnosticSink {
    fn warn(&mut self, message: fmt::Arguments<'_>);
    fn trace(&mut self, record: &TraceRecord);
}

/// Forwards to the `log` facade: warnings at WARN, trace lines at TRACE.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn warn(&mut self, message: fmt::Arguments<'_>) {
        log::warn!("{message}");
    }

    fn trace(&mut self, record: &TraceRecord) {
        log::trace!("{record}");
    }
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn warn(&mut self, _message: fmt::Arguments<'_>) {}

    fn trace(&mut self, _record: &TraceRecord) {}
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub warnings: Vec<String>,
    pub traces: Vec<TraceRecord>,
}

/// Keeps every diagnostic in memory. Clones share the same storage, so one
/// handle can be given to the machine and another kept for inspection.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    inner: Rc<RefCell<Recorded>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.inner.borrow().warnings.clone()
    }

    pub fn traces(&self) -> Vec<TraceRecord> {
        self.inner.borrow().traces.clone()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.warnings.clear();
        inner.traces.clear();
    }
}

impl DiagnosticSink for Recorder {
    fn warn(&mut self, message: fmt::Arguments<'_>) {
        self.inner.borrow_mut().warnings.push(message.to_string());
    }

    fn trace(&mut self, record: &TraceRecord) {
        self.inner.borrow_mut().traces.push(*record);
    }
}
