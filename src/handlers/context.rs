// GET /api/context - the caller's resolved scope

use axum::extract::{Extension, State};
use serde::Serialize;

use super::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::scope::{resolve_required_scope, ManagedContext, RequestContext, Scope};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextView {
    pub scope: Scope,
    pub managed_context: Option<ManagedContext>,
}

pub async fn context_get(
    State(state): State<AppState>,
    Extension(mut ctx): Extension<RequestContext>,
) -> ApiResult<ContextView> {
    let scope = resolve_required_scope(&mut ctx, state.store.as_ref(), "context lookup").await?;

    Ok(ApiResponse::success(ContextView {
        scope,
        managed_context: ctx.managed,
    }))
}
