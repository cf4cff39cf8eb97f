use tracing::{debug, info, warn};

use super::coerce::to_id_or_null;
use super::context::{RequestContext, Scope, ScopeDimension};
use crate::config;
use crate::database::store::ScopeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Infer the branch from the course when only a course is known
    pub derive_branch_from_course: bool,
    /// Ignore the scope cached on the request context
    pub refresh: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            derive_branch_from_course: config::config().scope.derive_branch_from_course,
            refresh: false,
        }
    }
}

impl ResolveOptions {
    pub fn refreshed(mut self) -> Self {
        self.refresh = true;
        self
    }

    pub fn without_derivation(mut self) -> Self {
        self.derive_branch_from_course = false;
        self
    }
}

/// Resolve the caller's scope from the managed-context override and user defaults.
///
/// The course → branch derivation is a convenience: a failed lookup is logged and
/// leaves the branch unset instead of failing the request.
pub async fn resolve_managed_scope<S>(
    ctx: &mut RequestContext,
    store: &S,
    options: ResolveOptions,
) -> Scope
where
    S: ScopeStore + ?Sized,
{
    if !options.refresh {
        if let Some(scope) = ctx.cached_scope() {
            return scope;
        }
    }

    let mut scope = Scope::new(
        to_id_or_null(ctx.raw_value(ScopeDimension::School)),
        to_id_or_null(ctx.raw_value(ScopeDimension::Branch)),
        to_id_or_null(ctx.raw_value(ScopeDimension::Course)),
    );

    if options.derive_branch_from_course && scope.branch_id.is_none() {
        if let Some(course_id) = scope.course_id {
            match store.course_branch_id(course_id).await {
                Ok(Some(branch_id)) => {
                    debug!("Derived branch {} from course {}", branch_id, course_id);
                    scope.branch_id = Some(branch_id);
                    scope.derived_branch_from_course = true;
                }
                Ok(None) => debug!("Course {} has no branch to derive", course_id),
                Err(e) => warn!("Failed to derive branch from course {}: {}", course_id, e),
            }
        }
    }

    if config::config().scope.audit_logging {
        info!(
            school_id = ?scope.school_id,
            branch_id = ?scope.branch_id,
            course_id = ?scope.course_id,
            derived = scope.derived_branch_from_course,
            "Resolved managed scope"
        );
    }

    ctx.cache_scope(scope);
    scope
}
