//! The handle every test receives for making assertions.
//!
//! Assertions are recorded in order and written to the reporter once the test
//! settles, inside the test's own reporting scope. Tests run one at a time,
//! so deferring the writes does not change the emitted order.

use crate::tap::Diagnostic;
use crate::value::Value;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    pub ok: bool,
    pub name: String,
    pub diagnostic: Option<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Assert(Assertion),
    Comment(String),
}

#[derive(Debug, Clone, Default)]
pub struct TestHandle {
    records: Rc<RefCell<Vec<Record>>>,
}

impl TestHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, ok: bool, name: impl Into<String>, diagnostic: Option<Diagnostic>) -> bool {
        self.records.borrow_mut().push(Record::Assert(Assertion {
            ok,
            name: name.into(),
            diagnostic,
        }));
        ok
    }

    pub fn ok(&self, condition: bool, message: impl Into<String>) -> bool {
        self.record(condition, message, None)
    }

    pub fn pass(&self, message: impl Into<String>) -> bool {
        self.record(true, message, None)
    }

    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.record(false, message, None)
    }

    /// Strict equality on any comparable Rust value.
    pub fn equal<T: PartialEq + Debug>(&self, found: T, wanted: T) -> bool {
        let ok = found == wanted;
        let diagnostic = (!ok).then(|| {
            Diagnostic::compared(
                Value::String(format!("{:?}", found)),
                Value::String(format!("{:?}", wanted)),
                "==",
            )
        });
        self.record(ok, "should be equal", diagnostic)
    }

    /// Structural equality on context values.
    pub fn same(&self, found: impl Into<Value>, wanted: impl Into<Value>) -> bool {
        let (found, wanted) = (found.into(), wanted.into());
        let ok = found == wanted;
        let diagnostic = (!ok).then(|| Diagnostic::compared(found, wanted, "same"));
        self.record(ok, "should be equivalent", diagnostic)
    }

    pub fn not_same(&self, found: impl Into<Value>, wanted: impl Into<Value>) -> bool {
        let (found, wanted) = (found.into(), wanted.into());
        let ok = found != wanted;
        let diagnostic = (!ok).then(|| Diagnostic::compared(found, wanted, "not same"));
        self.record(ok, "should not be equivalent", diagnostic)
    }

    pub fn comment(&self, text: impl Into<String>) {
        self.records.borrow_mut().push(Record::Comment(text.into()));
    }

    pub fn failure_count(&self) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|r| matches!(r, Record::Assert(a) if !a.ok))
            .count()
    }

    pub(crate) fn take_records(&self) -> Vec<Record> {
        std::mem::take(&mut *self.records.borrow_mut())
    }
}
