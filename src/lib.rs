//! Hierarchical test suites that thread a context through their tests and
//! report in nested TAP 13.
//!
//! ```rust
//! use suite_tooth::{context, execute_suite, SpecNode, SuiteOptions, TestGroup};
//!
//! let spec = SpecNode::from(
//!     TestGroup::new()
//!         .test("login", |_ctx, _t| async { Ok(context! { "user" => "ada" }) })
//!         .test("profile", |ctx, t| async move {
//!             t.same(ctx.get("user").cloned().unwrap_or_default(), "ada");
//!             Ok(context! {})
//!         }),
//! );
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let ctx = rt
//!     .block_on(execute_suite(&spec, Default::default(), SuiteOptions::new()))
//!     .unwrap();
//! assert_eq!(ctx, context! { "user" => "ada" });
//! ```

pub use crate::config::{OutputFormat, SuiteConfig};
pub use crate::context::{merge, Context};
pub use crate::engine::{
    execute_suite, execute_suite_with_summary, run_root_suite, HookFailure, SuiteOptions, SuiteRun,
};
pub use crate::errors::{SuiteError, TestError};
pub use crate::handle::TestHandle;
pub use crate::spec::{only, skip, SpecNode, TestFn, TestGroup};
pub use crate::tap::SuiteSummary;
pub use crate::value::Value;

pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod handle;
pub mod plan;
pub mod spec;
pub mod tap;
pub mod value;
