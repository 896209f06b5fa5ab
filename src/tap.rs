//! Nested TAP 13 output.
//!
//! The reporter keeps one counter per open scope. Entering a scope writes a
//! `# Subtest:` marker, every result consumes the next number of the current
//! scope, and leaving a scope writes its plan line, an optional
//! `# failed <k> test(s)` summary, and the scope's own result line one level
//! up. Each depth level indents by four spaces; failure blocks sit two
//! spaces below their result line.
//!
//! ```text
//! TAP version 13
//! # Subtest: FOO
//!     not ok 1 - foo error
//!       ---
//!       found:
//!         name: Error
//!         stack: ...
//!       ...
//!     1..1
//!     # failed 1 test
//! not ok 1 - FOO
//! 1..1
//! # failed 1 test
//! ```

use crate::errors::TestError;
use crate::handle::Record;
use crate::value::Value;
use serde::Serialize;

pub mod pretty;
pub mod sink;

pub use sink::{LineSink, NullSink, SharedBuffer, StdoutSink};

const INDENT: &str = "    ";
const BLOCK_INDENT: &str = "  ";

// ============================================================================
// FAILURE DIAGNOSTICS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thrown {
    pub name: String,
    pub stack: String,
}

/// The YAML attachment written beneath a failing result line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Diagnostic {
    Thrown {
        found: Thrown,
    },
    Compared {
        found: Value,
        wanted: Value,
        compare: String,
    },
}

impl Diagnostic {
    pub fn thrown(err: &TestError) -> Self {
        Diagnostic::Thrown {
            found: Thrown {
                name: err.name().to_string(),
                stack: err.stack(),
            },
        }
    }

    pub fn compared(found: Value, wanted: Value, compare: &str) -> Self {
        Diagnostic::Compared {
            found,
            wanted,
            compare: compare.to_string(),
        }
    }

    fn to_yaml(&self) -> String {
        serde_yaml::to_string(self)
            .unwrap_or_else(|e| format!("error: could not render diagnostic ({})\n", e))
    }
}

// ============================================================================
// REPORTER
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteSummary {
    /// Results recorded at the top level.
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl SuiteSummary {
    pub fn is_ok(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug)]
struct Scope {
    name: String,
    count: usize,
    failed: usize,
}

impl Scope {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            failed: 0,
        }
    }
}

pub struct TapReporter {
    sink: Box<dyn LineSink>,
    scopes: Vec<Scope>,
    transcript: Option<String>,
}

impl TapReporter {
    pub fn new(sink: Box<dyn LineSink>) -> Self {
        Self {
            sink,
            scopes: vec![Scope::new("")],
            transcript: None,
        }
    }

    /// Also keep a copy of every emitted line.
    pub fn with_transcript(mut self) -> Self {
        self.transcript = Some(String::new());
        self
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    fn emit(&mut self, depth: usize, line: &str) {
        self.write(format!("{}{}", INDENT.repeat(depth), line));
    }

    fn write(&mut self, line: String) {
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.push_str(&line);
            transcript.push('\n');
        }
        self.sink.emit(&line);
    }

    fn current(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Begins a fresh run: resets all counters and writes the version line.
    pub fn start(&mut self) {
        self.scopes = vec![Scope::new("")];
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.clear();
        }
        self.emit(0, "TAP version 13");
    }

    pub fn subtest(&mut self, name: &str) {
        let depth = self.depth();
        self.emit(depth, &format!("# Subtest: {}", name));
        self.scopes.push(Scope::new(name));
    }

    pub fn result(&mut self, ok: bool, name: &str, diagnostic: Option<&Diagnostic>) {
        let depth = self.depth();
        let scope = self.current();
        scope.count += 1;
        if !ok {
            scope.failed += 1;
        }
        let number = scope.count;
        let status = if ok { "ok" } else { "not ok" };
        self.emit(depth, &format!("{} {} - {}", status, number, name));

        if let Some(diagnostic) = diagnostic {
            let block_depth = format!("{}{}", INDENT.repeat(depth), BLOCK_INDENT);
            let yaml = diagnostic.to_yaml();
            let mut lines = vec!["---".to_string()];
            lines.extend(yaml.lines().map(str::to_string));
            lines.push("...".to_string());
            for line in lines {
                self.write(format!("{}{}", block_depth, line));
            }
        }
    }

    /// Reports a thrown test or hook error as a failed result.
    pub fn failure(&mut self, err: &TestError) {
        self.result(false, err.message(), Some(&Diagnostic::thrown(err)));
    }

    pub fn comment(&mut self, text: &str) {
        let depth = self.depth();
        self.emit(depth, &format!("# {}", text));
    }

    /// Writes the records a test handle collected into the current scope.
    pub fn records(&mut self, records: Vec<Record>) {
        for record in records {
            match record {
                Record::Assert(a) => self.result(a.ok, &a.name, a.diagnostic.as_ref()),
                Record::Comment(text) => self.comment(&text),
            }
        }
    }

    fn close_scope(&mut self, depth: usize, count: usize, failed: usize) {
        self.emit(depth, &format!("1..{}", count));
        if failed > 0 {
            let noun = if failed == 1 { "test" } else { "tests" };
            self.emit(depth, &format!("# failed {} {}", failed, noun));
        }
    }

    /// Closes the innermost subtest and reports it in its parent.
    /// Returns whether the subtest passed.
    pub fn end_subtest(&mut self) -> bool {
        if self.scopes.len() < 2 {
            return true;
        }
        let depth = self.depth();
        let Some(scope) = self.scopes.pop() else {
            return true;
        };
        self.close_scope(depth, scope.count, scope.failed);
        let ok = scope.failed == 0;
        self.result(ok, &scope.name, None);
        ok
    }

    /// Closes any open subtests and the top level.
    pub fn finish(&mut self) -> SuiteSummary {
        while self.scopes.len() > 1 {
            self.end_subtest();
        }
        let (count, failed) = {
            let root = self.current();
            (root.count, root.failed)
        };
        self.close_scope(0, count, failed);
        self.sink.finish();
        SuiteSummary {
            total: count,
            passed: count - failed,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter() -> (TapReporter, SharedBuffer) {
        let buffer = SharedBuffer::new();
        (TapReporter::new(Box::new(buffer.clone())), buffer)
    }

    #[test]
    fn empty_run_emits_zero_plan() {
        let (mut tap, out) = reporter();
        tap.start();
        let summary = tap.finish();
        assert_eq!(out.contents(), "TAP version 13\n1..0");
        assert_eq!(summary, SuiteSummary::default());
    }

    #[test]
    fn numbers_restart_per_level() {
        let (mut tap, out) = reporter();
        tap.start();
        tap.subtest("A");
        tap.result(true, "a1", None);
        tap.result(true, "a2", None);
        tap.end_subtest();
        tap.subtest("B");
        tap.end_subtest();
        tap.finish();
        assert_eq!(
            out.contents(),
            [
                "TAP version 13",
                "# Subtest: A",
                "    ok 1 - a1",
                "    ok 2 - a2",
                "    1..2",
                "ok 1 - A",
                "# Subtest: B",
                "    1..0",
                "ok 2 - B",
                "1..2",
            ]
            .join("\n")
        );
    }

    #[test]
    fn failures_propagate_and_pluralise() {
        let (mut tap, out) = reporter();
        tap.start();
        tap.subtest("A");
        tap.result(false, "x", None);
        tap.result(false, "y", None);
        assert!(!tap.end_subtest());
        let summary = tap.finish();
        let text = out.contents();
        assert!(text.contains("    1..2\n    # failed 2 tests\nnot ok 1 - A"));
        assert!(text.ends_with("1..1\n# failed 1 test"));
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn failure_block_follows_result_line() {
        let (mut tap, out) = reporter();
        tap.start();
        tap.subtest("FOO");
        tap.failure(&TestError::new("foo error"));
        tap.end_subtest();
        tap.finish();
        let text = out.contents();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "    not ok 1 - foo error");
        assert_eq!(lines[3], "      ---");
        assert_eq!(lines[4], "      found:");
        assert_eq!(lines[5], "        name: Error");
        assert!(lines[6].starts_with("        stack:"));
        assert!(lines.contains(&"      ..."));
    }

    #[test]
    fn transcript_matches_sink_output() {
        let buffer = SharedBuffer::new();
        let mut tap = TapReporter::new(Box::new(buffer.clone())).with_transcript();
        tap.start();
        tap.result(true, "one", None);
        tap.finish();
        assert_eq!(tap.transcript(), Some("TAP version 13\nok 1 - one\n1..1\n"));
        assert_eq!(buffer.contents(), "TAP version 13\nok 1 - one\n1..1");
    }
}
