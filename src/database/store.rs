use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgArguments, PgPool};
use tracing::debug;

use crate::config;
use crate::database::manager::DatabaseError;
use crate::scope::{RecordProbe, ScopedSql, SqlDialect, SqlResult};

/// Read-only lookups the scope layer needs from the relational store
#[async_trait]
pub trait ScopeStore: Send + Sync {
    /// Branch a course belongs to, `None` when the course is unknown or has no branch
    async fn course_branch_id(&self, course_id: i64) -> Result<Option<i64>, DatabaseError>;

    /// Whether at least one live row matches the probe
    async fn record_exists(&self, probe: &RecordProbe) -> Result<bool, DatabaseError>;
}

/// `ScopeStore` over a Postgres pool
#[derive(Clone)]
pub struct PgScopeStore {
    pool: PgPool,
}

impl PgScopeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run a scoped UPDATE/DELETE built for Postgres. Zero affected rows means the row
    /// vanished or left the scope since it was verified, and is reported as not found.
    ///
    /// `append_scope_to_sql` renders `?` placeholders unless the options select
    /// `SqlDialect::Postgres`, so statements from other dialects are refused here.
    pub async fn execute_scoped(&self, sql: ScopedSql) -> Result<u64, DatabaseError> {
        let sql = postgres_statement(sql)?;
        log_query(&sql);
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let affected = q.execute(&self.pool).await?.rows_affected();
        require_affected(affected)
    }
}

fn postgres_statement(sql: ScopedSql) -> Result<SqlResult, DatabaseError> {
    match sql.dialect() {
        SqlDialect::Postgres => Ok(sql.finish()),
        other => Err(DatabaseError::QueryError(format!(
            "cannot execute {:?} statement against Postgres",
            other
        ))),
    }
}

fn require_affected(affected: u64) -> Result<u64, DatabaseError> {
    if affected == 0 {
        return Err(DatabaseError::NotFound("Record not found".to_string()));
    }
    Ok(affected)
}

#[async_trait]
impl ScopeStore for PgScopeStore {
    async fn course_branch_id(&self, course_id: i64) -> Result<Option<i64>, DatabaseError> {
        let branch = sqlx::query_scalar::<_, Option<i64>>(
            r#"SELECT "branchId" FROM "courses" WHERE "id" = $1 AND "deletedAt" IS NULL"#,
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(branch.flatten())
    }

    async fn record_exists(&self, probe: &RecordProbe) -> Result<bool, DatabaseError> {
        let sql = probe
            .to_sql(SqlDialect::Postgres)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        log_query(&sql);

        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let row = q.fetch_optional(&self.pool).await?;
        Ok(row.is_some())
    }
}

fn log_query(sql: &SqlResult) {
    if config::config().database.enable_query_logging {
        debug!("SQL: {} -- params: {:?}", sql.query, sql.params);
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}
