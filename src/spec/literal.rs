//! Untyped literal trees using the reserved-key convention.
//!
//! Some callers describe suites as plain nested data: objects whose reserved
//! keys (`__beforeAll`, `__afterAll`, `__beforeEach`, `__afterEach`,
//! `__skip`, `__only`) carry hooks and flags next to the named children.
//! [`SpecNode::from_literal`] parses such a tree once, at the boundary, into
//! the typed model. Shapes that are neither a test, an array nor an object
//! are rejected with a structural error.

use super::{HookPhase, NodeKind, SpecNode, TestFn, TestGroup};
use crate::errors::SuiteError;

pub const BEFORE_ALL: &str = "__beforeAll";
pub const AFTER_ALL: &str = "__afterAll";
pub const BEFORE_EACH: &str = "__beforeEach";
pub const AFTER_EACH: &str = "__afterEach";
pub const SKIP: &str = "__skip";
pub const ONLY: &str = "__only";

pub fn is_reserved_key(key: &str) -> bool {
    matches!(
        key,
        BEFORE_ALL | AFTER_ALL | BEFORE_EACH | AFTER_EACH | SKIP | ONLY
    )
}

#[derive(Debug, Clone)]
pub enum Literal {
    Test(TestFn),
    /// An already-built node, e.g. the result of [`only`](super::only).
    Node(SpecNode),
    Array(Vec<Literal>),
    Object(Vec<(String, Literal)>),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Literal)>) -> Self {
        Literal::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array(items: impl IntoIterator<Item = Literal>) -> Self {
        Literal::Array(items.into_iter().collect())
    }

    fn type_name(&self) -> &'static str {
        match self {
            Literal::Test(_) => "test",
            Literal::Node(node) => node.kind().as_str(),
            Literal::Array(_) => "array",
            Literal::Object(_) => "object",
            Literal::Bool(_) => "bool",
            Literal::Null => "null",
        }
    }

    /// Which of the three node shapes this literal denotes.
    pub fn classify(&self) -> Result<NodeKind, SuiteError> {
        classify_at(self, &[])
    }
}

impl From<TestFn> for Literal {
    fn from(run: TestFn) -> Self {
        Literal::Test(run)
    }
}

impl From<SpecNode> for Literal {
    fn from(node: SpecNode) -> Self {
        Literal::Node(node)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl SpecNode {
    pub fn from_literal(literal: Literal) -> Result<SpecNode, SuiteError> {
        parse(literal, &mut Vec::new())
    }
}

impl TryFrom<Literal> for SpecNode {
    type Error = SuiteError;

    fn try_from(literal: Literal) -> Result<Self, Self::Error> {
        SpecNode::from_literal(literal)
    }
}

// ============================================================================
// PARSING
// ============================================================================

fn path_name(path: &[String]) -> String {
    path.join(" > ")
}

fn classify_at(literal: &Literal, path: &[String]) -> Result<NodeKind, SuiteError> {
    match literal {
        Literal::Test(_) => Ok(NodeKind::Test),
        Literal::Node(node) => Ok(node.kind()),
        Literal::Array(_) => Ok(NodeKind::TestList),
        Literal::Object(_) => Ok(NodeKind::TestGroup),
        Literal::Bool(_) | Literal::Null => Err(SuiteError::InvalidNode {
            path: path_name(path),
            found: literal.type_name(),
        }),
    }
}

fn parse(literal: Literal, path: &mut Vec<String>) -> Result<SpecNode, SuiteError> {
    match literal {
        Literal::Test(run) => Ok(run.into()),
        Literal::Node(node) => Ok(node),
        Literal::Array(items) => parse_list(items, path),
        Literal::Object(entries) => parse_group(entries, path),
        scalar => Err(SuiteError::InvalidNode {
            path: path_name(path),
            found: scalar.type_name(),
        }),
    }
}

fn parse_list(items: Vec<Literal>, path: &mut Vec<String>) -> Result<SpecNode, SuiteError> {
    let mut nodes = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let kind = classify_at(&item, path)?;
        if kind != NodeKind::Test {
            return Err(SuiteError::ListElementNotTest {
                path: path_name(path),
                index,
                found: kind.as_str(),
            });
        }
        nodes.push(parse(item, path)?);
    }
    Ok(SpecNode::list(nodes))
}

fn parse_group(
    entries: Vec<(String, Literal)>,
    path: &mut Vec<String>,
) -> Result<SpecNode, SuiteError> {
    let mut group = TestGroup::new();
    let mut flags = group.flags();
    for (key, value) in entries {
        match key.as_str() {
            BEFORE_ALL => parse_hooks(&mut group, HookPhase::BeforeAll, &key, value, path)?,
            AFTER_ALL => parse_hooks(&mut group, HookPhase::AfterAll, &key, value, path)?,
            BEFORE_EACH => parse_hooks(&mut group, HookPhase::BeforeEach, &key, value, path)?,
            AFTER_EACH => parse_hooks(&mut group, HookPhase::AfterEach, &key, value, path)?,
            SKIP => flags.skip = parse_flag(&key, value, path)?,
            ONLY => flags.only = parse_flag(&key, value, path)?,
            _ => {
                path.push(key.clone());
                let child = parse(value, path);
                path.pop();
                group.insert(key, child?);
            }
        }
    }
    let mut node = SpecNode::Group(group);
    *node.flags_mut() = flags;
    Ok(node)
}

fn parse_hooks(
    group: &mut TestGroup,
    phase: HookPhase,
    key: &str,
    value: Literal,
    path: &[String],
) -> Result<(), SuiteError> {
    let invalid = || SuiteError::InvalidReservedKey {
        path: path_name(path),
        key: key.to_string(),
        expected: "a test or an array of tests",
    };
    let hook_fn = |literal: Literal| match literal {
        Literal::Test(run) => Ok(run),
        Literal::Node(SpecNode::Test { run, .. }) => Ok(run),
        _ => Err(invalid()),
    };
    let hooks = match value {
        Literal::Array(items) => items.into_iter().map(hook_fn).collect::<Result<Vec<_>, _>>()?,
        single => vec![hook_fn(single)?],
    };
    group.hooks_mut().phase_mut(phase).extend(hooks);
    Ok(())
}

fn parse_flag(key: &str, value: Literal, path: &[String]) -> Result<bool, SuiteError> {
    match value {
        Literal::Bool(b) => Ok(b),
        Literal::Null => Ok(false),
        _ => Err(SuiteError::InvalidReservedKey {
            path: path_name(path),
            key: key.to_string(),
            expected: "a bool",
        }),
    }
}
