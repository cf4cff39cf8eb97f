use serde_json::{Map, Value};

use super::context::Scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhereScopeOptions {
    pub use_branch: bool,
    pub use_course: bool,
}

impl Default for WhereScopeOptions {
    fn default() -> Self {
        Self {
            use_branch: true,
            use_course: true,
        }
    }
}

impl WhereScopeOptions {
    pub fn school_only() -> Self {
        Self {
            use_branch: false,
            use_course: false,
        }
    }

    pub fn without_course() -> Self {
        Self {
            use_branch: true,
            use_course: false,
        }
    }
}

/// Return a copy of `base` with every set, enabled scope component written over
/// the same-named key. Caller-supplied values for those keys never survive; unset
/// components are left alone rather than written as null.
pub fn apply_scope_to_where(
    base: &Map<String, Value>,
    scope: &Scope,
    options: WhereScopeOptions,
) -> Map<String, Value> {
    let mut scoped = base.clone();
    for (dimension, id) in scope.components(options.use_branch, options.use_course) {
        scoped.insert(dimension.key().to_string(), Value::from(id));
    }
    scoped
}
