use serde::Serialize;

use super::coerce::{to_id_or_null, IdentifierSource};
use super::context::{RequestContext, Scope, ScopeDimension};
use super::error::ScopeError;
use super::resolver::{resolve_managed_scope, ResolveOptions};
use crate::database::store::ScopeStore;

/// Copy of `scope` with the school defaulted to `fallback_school_id` when absent
pub fn normalize_scope_with_school(scope: &Scope, fallback_school_id: Option<i64>) -> Scope {
    Scope {
        school_id: scope.school_id.or(fallback_school_id),
        ..*scope
    }
}

/// The one place a tenant becomes mandatory. Storage-touching handlers call this
/// before doing anything else.
pub fn require_school(scope: Scope, operation: &str) -> Result<Scope, ScopeError> {
    if scope.school_id.is_none() {
        return Err(ScopeError::missing(operation));
    }
    Ok(scope)
}

/// Resolve, default the school from the user's own school, and require a tenant
pub async fn resolve_required_scope<S>(
    ctx: &mut RequestContext,
    store: &S,
    operation: &str,
) -> Result<Scope, ScopeError>
where
    S: ScopeStore + ?Sized,
{
    let resolved = resolve_managed_scope(ctx, store, ResolveOptions::default()).await;
    let fallback = to_id_or_null(&ctx.user.school_id);
    require_school(normalize_scope_with_school(&resolved, fallback), operation)
}

/// Branch and course ids a create/update should persist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedIds {
    pub branch_id: Option<i64>,
    pub course_id: Option<i64>,
}

/// Reconcile branch/course ids from a request payload with the pinned scope.
///
/// A payload id that conflicts with a pinned scope value is rejected; otherwise the
/// pinned value wins, then the requested one.
pub fn reconcile_requested_ids<B, C>(
    scope: &Scope,
    requested_branch: &B,
    requested_course: &C,
) -> Result<ScopedIds, ScopeError>
where
    B: IdentifierSource + ?Sized,
    C: IdentifierSource + ?Sized,
{
    let branch_id = pick(scope, ScopeDimension::Branch, to_id_or_null(requested_branch))?;
    let course_id = pick(scope, ScopeDimension::Course, to_id_or_null(requested_course))?;
    Ok(ScopedIds { branch_id, course_id })
}

fn pick(
    scope: &Scope,
    dimension: ScopeDimension,
    requested: Option<i64>,
) -> Result<Option<i64>, ScopeError> {
    match (scope.get(dimension), requested) {
        (Some(pinned), Some(requested)) if pinned != requested => Err(ScopeError::ScopeMismatch {
            dimension,
            requested,
            pinned,
        }),
        (pinned, requested) => Ok(pinned.or(requested)),
    }
}
