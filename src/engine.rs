//! Execution engine: runs a [`Plan`] depth-first, threading the context and
//! driving the TAP reporter.
//!
//! Everything runs on a single thread of control. Each test, hook and group
//! finishes (descendants included) before the next sibling starts, so report
//! lines come out in execution order and the running context never needs
//! synchronisation.
//!
//! Failure boundaries:
//! - a failing test is reported `not ok` in its own scope; its delta is
//!   dropped and its siblings keep running;
//! - a failing hook stops its group. The parent reports the group as failed
//!   and carries on with its own remaining children;
//! - structural errors surface from [`Plan::build`] before anything runs.

use crate::config::SuiteConfig;
use crate::context::Context;
use crate::errors::{SuiteError, TestError};
use crate::handle::{Record, TestHandle};
use crate::plan::{Plan, PlanGroup, PlanNode};
use crate::spec::{HookPhase, Hooks, SpecNode, TestFn};
use crate::tap::{LineSink, NullSink, SuiteSummary, TapReporter};
use futures_util::future::{FutureExt, LocalBoxFuture};
use std::panic::AssertUnwindSafe;
use tracing::{debug, trace, warn};

// ============================================================================
// PUBLIC API
// ============================================================================

pub struct SuiteOptions {
    sink: Box<dyn LineSink>,
    on_complete: Option<Box<dyn FnOnce(&str)>>,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            sink: Box::new(NullSink),
            on_complete: None,
        }
    }
}

impl SuiteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where report lines go. Defaults to [`NullSink`].
    pub fn sink(mut self, sink: impl LineSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Receives the complete TAP transcript once the run has finished.
    pub fn on_complete(mut self, callback: impl FnOnce(&str) + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

/// A hook failed. Its group stops and the parent reports it as failed.
#[derive(Debug)]
pub struct HookFailure {
    pub phase: HookPhase,
    pub error: TestError,
    /// The running context at the moment the hook failed.
    pub context: Context,
}

#[derive(Debug, Clone)]
pub struct SuiteRun {
    pub context: Context,
    pub summary: SuiteSummary,
}

/// Runs `spec` and returns the final merged context.
///
/// Failing tests and hooks are reported, never returned; only a malformed
/// tree produces an error.
pub async fn execute_suite(
    spec: &SpecNode,
    initial: Context,
    options: SuiteOptions,
) -> Result<Context, SuiteError> {
    Ok(execute_suite_with_summary(spec, initial, options)
        .await?
        .context)
}

pub async fn execute_suite_with_summary(
    spec: &SpecNode,
    initial: Context,
    options: SuiteOptions,
) -> Result<SuiteRun, SuiteError> {
    let plan = Plan::build(spec)?;
    let SuiteOptions { sink, on_complete } = options;

    let mut reporter = TapReporter::new(sink);
    if on_complete.is_some() {
        reporter = reporter.with_transcript();
    }
    let mut executor = Executor { reporter };

    executor.reporter.start();
    let context = executor.run_root(plan.root(), initial).await;
    let summary = executor.reporter.finish();
    debug!(
        total = summary.total,
        failed = summary.failed,
        "suite finished"
    );

    if let Some(callback) = on_complete {
        callback(executor.reporter.transcript().unwrap_or_default());
    }
    Ok(SuiteRun { context, summary })
}

/// Blocking entry point for a `main`: runs `spec` on a single-threaded
/// runtime and writes the report to stdout as configured.
pub fn run_root_suite(spec: &SpecNode, config: SuiteConfig) -> Result<SuiteSummary, SuiteError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let options = SuiteOptions::new().sink(config.sink());
    let run = runtime.block_on(execute_suite_with_summary(spec, Context::new(), options))?;
    Ok(run.summary)
}

// ============================================================================
// EXECUTOR
// ============================================================================

struct Executor {
    reporter: TapReporter,
}

impl Executor {
    async fn run_root(&mut self, root: &PlanNode, ctx: Context) -> Context {
        match root {
            PlanNode::Test(run) => self.run_test(run, ctx).await,
            node => match self.run_node(node, ctx).await {
                Ok(ctx) => ctx,
                Err(failure) => {
                    self.reporter.failure(&failure.error);
                    failure.context
                }
            },
        }
    }

    fn run_node<'a>(
        &'a mut self,
        node: &'a PlanNode,
        ctx: Context,
    ) -> LocalBoxFuture<'a, Result<Context, HookFailure>> {
        async move {
            match node {
                PlanNode::Test(run) => Ok(self.run_test(run, ctx).await),
                PlanNode::List(tests) => Ok(self.run_list(tests, ctx).await),
                PlanNode::Group(group) => self.run_group(group, ctx).await,
            }
        }
        .boxed_local()
    }

    async fn run_group(
        &mut self,
        group: &PlanGroup,
        mut ctx: Context,
    ) -> Result<Context, HookFailure> {
        if group.is_noop() {
            return Ok(ctx);
        }
        debug!(children = group.children.len(), "entering group");

        ctx = run_hooks(&group.hooks, HookPhase::BeforeAll, ctx).await?;
        for (name, child) in &group.children {
            ctx = run_hooks(&group.hooks, HookPhase::BeforeEach, ctx).await?;

            self.reporter.subtest(name);
            ctx = match child {
                PlanNode::Test(run) => self.run_test(run, ctx).await,
                nested => match self.run_node(nested, ctx.clone()).await {
                    Ok(next) => next,
                    Err(failure) => {
                        self.reporter.failure(&failure.error);
                        ctx
                    }
                },
            };
            self.reporter.end_subtest();

            ctx = run_hooks(&group.hooks, HookPhase::AfterEach, ctx).await?;
        }
        run_hooks(&group.hooks, HookPhase::AfterAll, ctx).await
    }

    async fn run_list(&mut self, tests: &[(String, TestFn)], mut ctx: Context) -> Context {
        for (name, run) in tests {
            self.reporter.subtest(name);
            ctx = self.run_test(run, ctx).await;
            self.reporter.end_subtest();
        }
        ctx
    }

    async fn run_test(&mut self, run: &TestFn, ctx: Context) -> Context {
        let handle = TestHandle::new();
        let outcome = invoke(run, ctx.clone(), handle.clone()).await;
        self.reporter.records(handle.take_records());
        match outcome {
            Ok(delta) => ctx.merge(&delta),
            Err(err) => {
                debug!(error = %err, "test failed");
                self.reporter.failure(&err);
                ctx
            }
        }
    }
}

async fn invoke(run: &TestFn, ctx: Context, handle: TestHandle) -> Result<Context, TestError> {
    let run = run.clone();
    match AssertUnwindSafe(async move { run.call(ctx, handle).await })
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(payload) => Err(TestError::from_panic(payload)),
    }
}

/// Runs one phase of hooks in order, merging after each.
///
/// Hooks never produce result lines. A failed assertion inside a hook counts
/// as the hook failing.
async fn run_hooks(
    hooks: &Hooks,
    phase: HookPhase,
    mut ctx: Context,
) -> Result<Context, HookFailure> {
    for (index, hook) in hooks.phase(phase).iter().enumerate() {
        trace!(%phase, index, "running hook");
        let handle = TestHandle::new();
        let outcome = invoke(hook, ctx.clone(), handle.clone()).await;
        let failed_assertion = handle.take_records().into_iter().find_map(|r| match r {
            Record::Assert(a) if !a.ok => Some(a.name),
            _ => None,
        });

        let error = match (outcome, failed_assertion) {
            (Err(err), _) => err,
            (Ok(_), Some(name)) => {
                TestError::detached(format!("{} hook assertion failed: {}", phase, name))
            }
            (Ok(delta), None) => {
                ctx = ctx.merge(&delta);
                continue;
            }
        };
        warn!(%phase, index, error = %error, "hook failed");
        return Err(HookFailure {
            phase,
            error,
            context: ctx,
        });
    }
    Ok(ctx)
}
