use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Extension, Router,
};
use serde_json::Value;
use tower::ServiceExt;

use school_scope::database::{DatabaseError, ScopeStore};
use school_scope::handlers::{app, AppState};
use school_scope::scope::{RecordProbe, ScopeUser};

/// Course → branch lookups only; record probes always miss
#[derive(Default)]
pub struct CourseStore {
    pub courses: HashMap<i64, i64>,
    pub broken: bool,
}

#[async_trait]
impl ScopeStore for CourseStore {
    async fn course_branch_id(&self, course_id: i64) -> Result<Option<i64>, DatabaseError> {
        if self.broken {
            return Err(DatabaseError::QueryError("connection reset".to_string()));
        }
        Ok(self.courses.get(&course_id).copied())
    }

    async fn record_exists(&self, _probe: &RecordProbe) -> Result<bool, DatabaseError> {
        Ok(false)
    }
}

/// Router as the auth layer would hand it over: `user` is already attached
pub fn router(store: CourseStore, user: Option<ScopeUser>) -> Router {
    let router = app(AppState::new(Arc::new(store)));
    match user {
        Some(user) => router.layer(Extension(user)),
        None => router,
    }
}

pub async fn get_json(
    router: Router,
    uri: &str,
    headers: &[(&str, &str)],
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = router
        .oneshot(builder.body(Body::empty())?)
        .await
        .context("router call failed")?;

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let payload = serde_json::from_slice(&bytes).context("response was not JSON")?;
    Ok((status, payload))
}
