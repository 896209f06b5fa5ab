//! The accumulating key/value state threaded through a suite.
//!
//! A [`Context`] is never mutated in place. Every step receives the running
//! context and hands back a delta; the engine overlays that delta with
//! [`merge`] and passes the result on to the next step. The backing
//! `im::OrdMap` makes the copies structural, so holding on to an older
//! context costs next to nothing.

use crate::value::Value;
use im::OrdMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(OrdMap<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self(OrdMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Reads an integral number, treating a missing key as `None`.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns a new context with `key` bound to `value`.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self(self.0.update(key.into(), value.into()))
    }

    /// Returns a new context without `key`.
    pub fn without(&self, key: &str) -> Self {
        Self(self.0.without(key))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlays `delta` on top of this context. See [`merge`].
    pub fn merge(&self, delta: &Context) -> Self {
        merge(self, delta)
    }
}

/// Shallow overlay of `delta` onto `base`.
///
/// Keys present in `delta` win, everything else is carried over from `base`.
/// Nested lists and maps are replaced wholesale, never combined.
///
/// ```rust
/// use suite_tooth::context::merge;
/// use suite_tooth::context;
///
/// let base = context! { "foo" => 1, "bar" => vec![1, 2] };
/// let merged = merge(&base, &context! { "bar" => vec![3] });
/// assert_eq!(merged, context! { "foo" => 1, "bar" => vec![3] });
/// ```
pub fn merge(base: &Context, delta: &Context) -> Context {
    if delta.is_empty() {
        return base.clone();
    }
    let mut map = base.0.clone();
    for (key, value) in delta.0.iter() {
        map.insert(key.clone(), value.clone());
    }
    Context(map)
}

impl From<Context> for Value {
    fn from(ctx: Context) -> Self {
        Value::Map(ctx.0)
    }
}

impl From<OrdMap<String, Value>> for Context {
    fn from(map: OrdMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Map(self.0.clone()))
    }
}

/// Builds a [`Context`] from `key => value` pairs.
///
/// ```rust
/// use suite_tooth::context;
/// let ctx = context! { "count" => 1, "ready" => true };
/// assert_eq!(ctx.get_i64("count"), Some(1));
/// assert!(context! {}.is_empty());
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::context::Context::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let ctx = $crate::context::Context::new();
        $(let ctx = ctx.with($key, $value);)+
        ctx
    }};
}
