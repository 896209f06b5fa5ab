//! Shared helpers for the integration tests.
#![allow(dead_code)]

use regex::Regex;
use std::cell::RefCell;
use std::rc::Rc;
use suite_tooth::tap::SharedBuffer;
use suite_tooth::{context, execute_suite, Context, SpecNode, SuiteOptions, TestFn};

/// Runs `spec` from an empty context and returns the final context and the
/// TAP text.
pub async fn run(spec: &SpecNode) -> (Context, String) {
    run_from(spec, Context::new()).await
}

pub async fn run_from(spec: &SpecNode, initial: Context) -> (Context, String) {
    let out = SharedBuffer::new();
    let ctx = execute_suite(spec, initial, SuiteOptions::new().sink(out.clone()))
        .await
        .expect("suite should be well formed");
    (ctx, out.contents())
}

/// Drops `stack:` entries from failure blocks. Stacks carry source
/// locations, which would make exact comparisons brittle.
pub fn without_stacks(tap: &str) -> String {
    let stack = Regex::new(r"^(\s*)stack:").unwrap();
    let mut kept = Vec::new();
    let mut skipping_deeper_than: Option<usize> = None;
    for line in tap.lines() {
        let indent = line.len() - line.trim_start().len();
        if let Some(depth) = skipping_deeper_than {
            if indent > depth {
                continue;
            }
            skipping_deeper_than = None;
        }
        if let Some(caps) = stack.captures(line) {
            skipping_deeper_than = Some(caps[1].len());
            continue;
        }
        kept.push(line);
    }
    kept.join("\n")
}

pub fn lines(expected: &[&str]) -> String {
    expected.join("\n")
}

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// A hook or test that appends `label` to `log` and returns an empty delta.
pub fn logged(log: &Log, label: &str) -> TestFn {
    let log = log.clone();
    let label = label.to_string();
    TestFn::sync(move |_, _| {
        log.borrow_mut().push(label.clone());
        Ok(context! {})
    })
}

pub fn increment(key: &'static str) -> TestFn {
    TestFn::sync(move |ctx, _| Ok(context! { key => ctx.get_i64(key).unwrap_or(0) + 1 }))
}

pub fn noop() -> SpecNode {
    SpecNode::sync(|_, _| Ok(Context::new()))
}

/// A test that sets `key` to `true`.
pub fn marks(key: &'static str) -> SpecNode {
    SpecNode::sync(move |_, _| Ok(context! { key => true }))
}
