//! Line sinks the reporter writes into.
//!
//! A sink receives complete lines in call order and must not block the
//! caller indefinitely. The engine never reads anything back from a sink.

use std::cell::RefCell;
use std::rc::Rc;

pub trait LineSink {
    fn emit(&mut self, line: &str);

    /// Called once after the last line of a run.
    fn finish(&mut self) {}
}

impl<S: LineSink + ?Sized> LineSink for Box<S> {
    fn emit(&mut self, line: &str) {
        (**self).emit(line)
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}

/// Collects output into a shared string for tests or programmatic capture.
///
/// Clones share the same buffer, so keep one clone and hand the other to the
/// reporter.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    buffer: Rc<RefCell<String>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }
}

impl LineSink for SharedBuffer {
    fn emit(&mut self, line: &str) {
        let mut buffer = self.buffer.borrow_mut();
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(line);
    }
}

/// Writes raw TAP to stdout.
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn emit(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Discards everything.
pub struct NullSink;

impl LineSink for NullSink {
    fn emit(&mut self, _line: &str) {}
}
