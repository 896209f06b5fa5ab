//! The specification model: tests, lists of tests, and named groups with
//! lifecycle hooks and skip/only flags.
//!
//! A tree is built once, either through the builder API on [`TestGroup`] or
//! by parsing a [`Literal`](literal::Literal), and is read-only afterwards.
//! Name prefixes (`ONLY`, `SKIP`) are turned into [`Flags`] when a child is
//! added, so nothing downstream looks at names to decide filtering.

use crate::context::Context;
use crate::errors::TestError;
use crate::handle::TestHandle;
use futures_util::future::{FutureExt, LocalBoxFuture};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

pub mod literal;

/// A child name starting with this marks the child as only.
pub const ONLY_PREFIX: &str = "ONLY";
/// A child name starting with this marks the child as skipped.
pub const SKIP_PREFIX: &str = "SKIP";

pub type TestFuture = LocalBoxFuture<'static, Result<Context, TestError>>;

// ============================================================================
// TEST OPERATIONS
// ============================================================================

/// An executable test or hook.
///
/// Receives the running context and a [`TestHandle`] for assertions, and
/// resolves to a context delta. An empty delta merges nothing.
#[derive(Clone)]
pub struct TestFn(Rc<dyn Fn(Context, TestHandle) -> TestFuture>);

impl TestFn {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Context, TestHandle) -> Fut + 'static,
        Fut: Future<Output = Result<Context, TestError>> + 'static,
    {
        Self(Rc::new(move |ctx, t| f(ctx, t).boxed_local()))
    }

    /// Wraps a synchronous closure.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Context, &TestHandle) -> Result<Context, TestError> + 'static,
    {
        Self(Rc::new(move |ctx, t| {
            let result = f(ctx, &t);
            async move { result }.boxed_local()
        }))
    }

    pub(crate) fn call(&self, ctx: Context, handle: TestHandle) -> TestFuture {
        (self.0)(ctx, handle)
    }
}

impl<F, Fut> From<F> for TestFn
where
    F: Fn(Context, TestHandle) -> Fut + 'static,
    Fut: Future<Output = Result<Context, TestError>> + 'static,
{
    fn from(f: F) -> Self {
        TestFn::new(f)
    }
}

impl fmt::Debug for TestFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestFn(..)")
    }
}

// ============================================================================
// FLAGS AND HOOKS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub skip: bool,
    pub only: bool,
}

impl Flags {
    /// Flags implied by a child name.
    ///
    /// ```rust
    /// use suite_tooth::spec::Flags;
    /// assert!(Flags::from_name("ONLY: fast path").only);
    /// assert!(Flags::from_name("SKIP flaky").skip);
    /// assert_eq!(Flags::from_name("plain"), Flags::default());
    /// ```
    pub fn from_name(name: &str) -> Self {
        Self {
            skip: name.starts_with(SKIP_PREFIX),
            only: name.starts_with(ONLY_PREFIX),
        }
    }

    fn absorb(&mut self, other: Flags) {
        self.skip |= other.skip;
        self.only |= other.only;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    BeforeAll,
    BeforeEach,
    AfterEach,
    AfterAll,
}

impl HookPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPhase::BeforeAll => "beforeAll",
            HookPhase::BeforeEach => "beforeEach",
            HookPhase::AfterEach => "afterEach",
            HookPhase::AfterAll => "afterAll",
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle hooks of a group, each phase run in declared order.
#[derive(Debug, Clone, Default)]
pub struct Hooks {
    pub before_all: Vec<TestFn>,
    pub before_each: Vec<TestFn>,
    pub after_each: Vec<TestFn>,
    pub after_all: Vec<TestFn>,
}

impl Hooks {
    pub fn phase(&self, phase: HookPhase) -> &[TestFn] {
        match phase {
            HookPhase::BeforeAll => &self.before_all,
            HookPhase::BeforeEach => &self.before_each,
            HookPhase::AfterEach => &self.after_each,
            HookPhase::AfterAll => &self.after_all,
        }
    }

    pub fn phase_mut(&mut self, phase: HookPhase) -> &mut Vec<TestFn> {
        match phase {
            HookPhase::BeforeAll => &mut self.before_all,
            HookPhase::BeforeEach => &mut self.before_each,
            HookPhase::AfterEach => &mut self.after_each,
            HookPhase::AfterAll => &mut self.after_all,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.before_all.is_empty()
            && self.before_each.is_empty()
            && self.after_each.is_empty()
            && self.after_all.is_empty()
    }
}

// ============================================================================
// SPEC NODES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Test,
    TestList,
    TestGroup,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Test => "test",
            NodeKind::TestList => "list",
            NodeKind::TestGroup => "group",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SpecNode {
    Test { run: TestFn, flags: Flags },
    List { items: Vec<SpecNode>, flags: Flags },
    Group(TestGroup),
}

impl SpecNode {
    /// An asynchronous test.
    ///
    /// ```rust
    /// use suite_tooth::{context, SpecNode};
    /// let node = SpecNode::test(|_ctx, _t| async { Ok(context! { "foo" => 1 }) });
    /// assert_eq!(node.kind(), suite_tooth::spec::NodeKind::Test);
    /// ```
    pub fn test<F, Fut>(f: F) -> Self
    where
        F: Fn(Context, TestHandle) -> Fut + 'static,
        Fut: Future<Output = Result<Context, TestError>> + 'static,
    {
        TestFn::new(f).into()
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Context, &TestHandle) -> Result<Context, TestError> + 'static,
    {
        TestFn::sync(f).into()
    }

    pub fn list(items: impl IntoIterator<Item = SpecNode>) -> Self {
        SpecNode::List {
            items: items.into_iter().collect(),
            flags: Flags::default(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            SpecNode::Test { .. } => NodeKind::Test,
            SpecNode::List { .. } => NodeKind::TestList,
            SpecNode::Group(_) => NodeKind::TestGroup,
        }
    }

    pub fn flags(&self) -> Flags {
        match self {
            SpecNode::Test { flags, .. } | SpecNode::List { flags, .. } => *flags,
            SpecNode::Group(group) => group.flags,
        }
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        match self {
            SpecNode::Test { flags, .. } | SpecNode::List { flags, .. } => flags,
            SpecNode::Group(group) => &mut group.flags,
        }
    }
}

impl From<TestFn> for SpecNode {
    fn from(run: TestFn) -> Self {
        SpecNode::Test {
            run,
            flags: Flags::default(),
        }
    }
}

impl From<TestGroup> for SpecNode {
    fn from(group: TestGroup) -> Self {
        SpecNode::Group(group)
    }
}

impl From<Vec<SpecNode>> for SpecNode {
    fn from(items: Vec<SpecNode>) -> Self {
        SpecNode::list(items)
    }
}

/// Named children plus hooks and flags.
///
/// Children keep insertion order. Adding a child under an existing name
/// replaces it in place.
#[derive(Debug, Clone, Default)]
pub struct TestGroup {
    children: Vec<(String, SpecNode)>,
    hooks: Hooks,
    flags: Flags,
}

impl TestGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(mut self, name: impl Into<String>, node: impl Into<SpecNode>) -> Self {
        self.insert(name, node);
        self
    }

    /// Shorthand for an asynchronous test child.
    pub fn test<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Context, TestHandle) -> Fut + 'static,
        Fut: Future<Output = Result<Context, TestError>> + 'static,
    {
        self.child(name, SpecNode::test(f))
    }

    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<SpecNode>) {
        let name = name.into();
        let mut node = node.into();
        node.flags_mut().absorb(Flags::from_name(&name));
        match self.children.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = node,
            None => self.children.push((name, node)),
        }
    }

    pub fn hook(mut self, phase: HookPhase, hook: impl Into<TestFn>) -> Self {
        self.hooks.phase_mut(phase).push(hook.into());
        self
    }

    pub fn before_all(self, hook: impl Into<TestFn>) -> Self {
        self.hook(HookPhase::BeforeAll, hook)
    }

    pub fn before_each(self, hook: impl Into<TestFn>) -> Self {
        self.hook(HookPhase::BeforeEach, hook)
    }

    pub fn after_each(self, hook: impl Into<TestFn>) -> Self {
        self.hook(HookPhase::AfterEach, hook)
    }

    pub fn after_all(self, hook: impl Into<TestFn>) -> Self {
        self.hook(HookPhase::AfterAll, hook)
    }

    pub fn children(&self) -> &[(String, SpecNode)] {
        &self.children
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub(crate) fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }
}

// ============================================================================
// FLAG RESOLUTION
// ============================================================================

/// Returns a copy of `spec` with the only flag set.
pub fn only(spec: impl Into<SpecNode>) -> SpecNode {
    let mut node = spec.into();
    node.flags_mut().only = true;
    node
}

/// Returns a copy of `spec` with the skip flag set.
pub fn skip(spec: impl Into<SpecNode>) -> SpecNode {
    let mut node = spec.into();
    node.flags_mut().skip = true;
    node
}

pub fn is_only_flagged(node: &SpecNode) -> bool {
    node.flags().only
}

pub fn is_skip_flagged(node: &SpecNode) -> bool {
    node.flags().skip
}

/// True when some non-skipped descendant of a group is only-flagged.
///
/// Tests and lists never report an only-descendant: only-flags inside a list
/// are resolved when the list itself runs. A skipped group prunes its whole
/// subtree, so nothing below it counts.
pub fn has_only_descendant(node: &SpecNode) -> bool {
    match node {
        SpecNode::Test { .. } | SpecNode::List { .. } => false,
        SpecNode::Group(group) => {
            !group.flags.skip
                && group
                    .children
                    .iter()
                    .filter(|(_, child)| !is_skip_flagged(child))
                    .any(|(_, child)| is_only_flagged(child) || has_only_descendant(child))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> SpecNode {
        SpecNode::sync(|_, _| Ok(Context::new()))
    }

    #[test]
    fn name_prefixes_set_flags() {
        let group = TestGroup::new()
            .child("ONLY: focused", noop())
            .child("SKIP broken", noop())
            .child("plain", noop());
        let flags: Vec<Flags> = group.children().iter().map(|(_, n)| n.flags()).collect();
        assert!(flags[0].only && !flags[0].skip);
        assert!(flags[1].skip && !flags[1].only);
        assert_eq!(flags[2], Flags::default());
        assert_eq!(group.children()[0].0, "ONLY: focused");
    }

    #[test]
    fn prefix_and_wrapper_are_equivalent() {
        let prefixed = TestGroup::new().child("SKIP foo", noop());
        let wrapped = TestGroup::new().child("foo", skip(noop()));
        assert_eq!(prefixed.children()[0].1.flags(), wrapped.children()[0].1.flags());
    }

    #[test]
    fn reinserting_a_name_replaces_in_place() {
        let group = TestGroup::new()
            .child("a", noop())
            .child("b", noop())
            .child("a", SpecNode::list(vec![noop()]));
        assert_eq!(group.children().len(), 2);
        assert_eq!(group.children()[0].1.kind(), NodeKind::TestList);
    }

    #[test]
    fn only_descendant_is_found_through_nested_groups() {
        let inner = TestGroup::new().child("leaf", only(noop()));
        let outer = SpecNode::from(TestGroup::new().child("inner", inner).child("other", noop()));
        assert!(has_only_descendant(&outer));
    }

    #[test]
    fn skipped_subtrees_never_count_as_only() {
        let inner = TestGroup::new().child("leaf", only(noop()));
        let outer = SpecNode::from(TestGroup::new().child("inner", skip(inner)));
        assert!(!has_only_descendant(&outer));

        let skipped_only = SpecNode::from(TestGroup::new().child("x", skip(only(noop()))));
        assert!(!has_only_descendant(&skipped_only));
    }

    #[test]
    fn lists_and_tests_have_no_only_descendants() {
        assert!(!has_only_descendant(&only(noop())));
        assert!(!has_only_descendant(&SpecNode::list(vec![only(noop())])));
    }
}
