use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::config;
use crate::error::ApiError;
use crate::scope::{ManagedContext, RequestContext, ScopeUser};

pub const SCHOOL_HEADERS: &[&str] =
    &["x-managed-school-id", "x-school-id", "x-school", "school-id"];
pub const BRANCH_HEADERS: &[&str] = &["x-managed-branch-id", "x-branch-id", "branch-id"];
pub const COURSE_HEADERS: &[&str] = &["x-managed-course-id", "x-course-id", "course-id"];

/// Read managed-context override headers. A header that is present but blank or
/// `null` is an explicit clear; `None` means no override header was sent at all.
pub fn read_managed_context(headers: &HeaderMap, accept_legacy: bool) -> Option<ManagedContext> {
    let context = ManagedContext {
        school_id: first_header(headers, SCHOOL_HEADERS, accept_legacy),
        branch_id: first_header(headers, BRANCH_HEADERS, accept_legacy),
        course_id: first_header(headers, COURSE_HEADERS, accept_legacy),
    };
    (!context.is_empty()).then_some(context)
}

fn first_header(headers: &HeaderMap, names: &[&str], accept_legacy: bool) -> Option<Value> {
    // The first name is the canonical x-managed-* header
    let candidates = if accept_legacy { names } else { &names[..1] };
    candidates.iter().find_map(|name| {
        let value = headers.get(*name)?;
        match value.to_str() {
            Ok(s) => Some(Value::String(s.to_string())),
            Err(_) => {
                tracing::debug!("Ignoring non-UTF-8 {} header", name);
                None
            }
        }
    })
}

/// Middleware that builds the request-scoped `RequestContext` from the authenticated
/// `ScopeUser` and any managed-context headers
pub async fn managed_context_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<ScopeUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required before scope resolution"))?;

    let accept_legacy = config::config().scope.accept_legacy_headers;
    let managed = read_managed_context(request.headers(), accept_legacy);
    if let Some(managed) = &managed {
        tracing::debug!("Managed context override: {:?}", managed);
    }

    request.extensions_mut().insert(RequestContext::new(user, managed));
    Ok(next.run(request).await)
}
