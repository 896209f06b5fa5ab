//! Plan/traversal: resolves a [`SpecNode`] tree into exactly what will run.
//!
//! Building a [`Plan`] applies every structural check and all skip/only
//! filtering up front, so a malformed tree is rejected before the first test
//! executes. The executor then walks the plan without looking at flags again.
//!
//! For a group the order is fixed:
//! 1. drop skipped children,
//! 2. if nothing is left the group is a no-op (no hooks, no children),
//! 3. if any remaining child is only-flagged or holds an only-flagged
//!    descendant, keep just those,
//! 4. the survivors run in insertion order under the group's hooks.

use crate::errors::SuiteError;
use crate::spec::{
    has_only_descendant, is_only_flagged, is_skip_flagged, HookPhase, Hooks, SpecNode,
    TestFn, TestGroup,
};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub enum PlanNode {
    Test(TestFn),
    /// Surviving list elements with their generated `<path>-<i>` names.
    List(Vec<(String, TestFn)>),
    Group(PlanGroup),
}

#[derive(Debug, Clone, Default)]
pub struct PlanGroup {
    pub hooks: Hooks,
    pub children: Vec<(String, PlanNode)>,
}

impl PlanGroup {
    pub fn is_noop(&self) -> bool {
        self.children.is_empty()
    }
}

/// One entry of the flattened execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub path: Vec<String>,
    pub kind: StepKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Hook(HookPhase, usize),
    Test,
}

#[derive(Debug, Clone)]
pub struct Plan {
    root: PlanNode,
}

impl Plan {
    pub fn build(spec: &SpecNode) -> Result<Plan, SuiteError> {
        let root = if is_skip_flagged(spec) {
            debug!("root is skipped, nothing to run");
            PlanNode::Group(PlanGroup::default())
        } else {
            plan_node(spec, &mut Vec::new())?
        };
        Ok(Plan { root })
    }

    pub fn root(&self) -> &PlanNode {
        &self.root
    }

    /// Every hook and test invocation in execution order.
    pub fn steps(&self) -> Vec<Step> {
        let mut steps = Vec::new();
        collect_steps(&self.root, &mut Vec::new(), &mut steps);
        steps
    }

    pub fn test_count(&self) -> usize {
        self.steps()
            .iter()
            .filter(|step| step.kind == StepKind::Test)
            .count()
    }
}

fn path_name(path: &[String]) -> String {
    path.join(" > ")
}

fn plan_node(node: &SpecNode, path: &mut Vec<String>) -> Result<PlanNode, SuiteError> {
    match node {
        SpecNode::Test { run, .. } => Ok(PlanNode::Test(run.clone())),
        SpecNode::List { items, .. } => plan_list(items, path),
        SpecNode::Group(group) => plan_group(group, path),
    }
}

fn plan_list(items: &[SpecNode], path: &[String]) -> Result<PlanNode, SuiteError> {
    let mut tests = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let SpecNode::Test { run, flags } = item else {
            return Err(SuiteError::ListElementNotTest {
                path: path_name(path),
                index,
                found: item.kind().as_str(),
            });
        };
        if !flags.skip {
            tests.push((run, flags.only));
        }
    }

    let only_mode = tests.iter().any(|(_, only)| *only);
    if only_mode {
        trace!(path = %path_name(path), "list runs in only mode");
        tests.retain(|(_, only)| *only);
    }

    let base = path_name(path);
    Ok(PlanNode::List(
        tests
            .into_iter()
            .enumerate()
            .map(|(i, (run, _))| (format!("{}-{}", base, i), run.clone()))
            .collect(),
    ))
}

fn plan_group(group: &TestGroup, path: &mut Vec<String>) -> Result<PlanNode, SuiteError> {
    let mut eligible: Vec<&(String, SpecNode)> = group
        .children()
        .iter()
        .filter(|(_, child)| !is_skip_flagged(child))
        .collect();

    if eligible.is_empty() {
        debug!(path = %path_name(path), "group has no eligible children");
        return Ok(PlanNode::Group(PlanGroup::default()));
    }

    let selected = |child: &SpecNode| is_only_flagged(child) || has_only_descendant(child);
    if eligible.iter().any(|(_, child)| selected(child)) {
        trace!(path = %path_name(path), "group runs in only mode");
        eligible.retain(|(_, child)| selected(child));
    }

    let mut children = Vec::with_capacity(eligible.len());
    for (name, child) in eligible {
        path.push(name.clone());
        let planned = plan_node(child, path);
        path.pop();
        children.push((name.clone(), planned?));
    }

    Ok(PlanNode::Group(PlanGroup {
        hooks: group.hooks().clone(),
        children,
    }))
}

fn collect_steps(node: &PlanNode, path: &mut Vec<String>, out: &mut Vec<Step>) {
    match node {
        PlanNode::Test(_) => out.push(Step {
            path: path.clone(),
            kind: StepKind::Test,
        }),
        PlanNode::List(tests) => {
            for (name, _) in tests {
                path.push(name.clone());
                out.push(Step {
                    path: path.clone(),
                    kind: StepKind::Test,
                });
                path.pop();
            }
        }
        PlanNode::Group(group) => {
            if group.is_noop() {
                return;
            }
            let hooks = |phase: HookPhase, path: &[String], out: &mut Vec<Step>| {
                for i in 0..group.hooks.phase(phase).len() {
                    out.push(Step {
                        path: path.to_vec(),
                        kind: StepKind::Hook(phase, i),
                    });
                }
            };
            hooks(HookPhase::BeforeAll, path, out);
            for (name, child) in &group.children {
                hooks(HookPhase::BeforeEach, path, out);
                path.push(name.clone());
                collect_steps(child, path, out);
                path.pop();
                hooks(HookPhase::AfterEach, path, out);
            }
            hooks(HookPhase::AfterAll, path, out);
        }
    }
}
