use serde_json::Value;
use tracing::{debug, error};

use super::coerce::{to_id_or_null, IdentifierSource};
use super::context::{Scope, ScopeDimension};
use super::error::ScopeError;
use super::sql::{validate_identifier, ScopedSql, SqlDialect, SqlResult};
use crate::database::store::ScopeStore;
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub id_column: String,
    pub branch_column: String,
    pub course_column: String,
    pub deleted_column: String,
    pub use_branch: bool,
    pub use_course: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            branch_column: ScopeDimension::Branch.key().to_string(),
            course_column: ScopeDimension::Course.key().to_string(),
            deleted_column: "deletedAt".to_string(),
            use_branch: true,
            use_course: true,
        }
    }
}

impl VerifyOptions {
    pub fn without_course() -> Self {
        Self {
            use_course: false,
            ..Self::default()
        }
    }

    pub fn school_only() -> Self {
        Self {
            use_branch: false,
            use_course: false,
            ..Self::default()
        }
    }

    pub fn course_column(mut self, column: impl Into<String>) -> Self {
        self.course_column = column.into();
        self
    }
}

/// Existence check for one live row under a scope, in store-neutral form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordProbe {
    pub table: String,
    pub id_column: String,
    pub id: i64,
    pub deleted_column: String,
    /// (column, value) pairs the row must match
    pub predicates: Vec<(String, i64)>,
}

impl RecordProbe {
    pub fn new(table: &str, id: i64, scope: &Scope, options: &VerifyOptions) -> Self {
        let predicates = scope
            .components(options.use_branch, options.use_course)
            .map(|(dimension, value)| {
                let column = match dimension {
                    ScopeDimension::School => ScopeDimension::School.key().to_string(),
                    ScopeDimension::Branch => options.branch_column.clone(),
                    ScopeDimension::Course => options.course_column.clone(),
                };
                (column, value)
            })
            .collect();

        Self {
            table: table.to_string(),
            id_column: options.id_column.clone(),
            id,
            deleted_column: options.deleted_column.clone(),
            predicates,
        }
    }

    pub fn validate(&self) -> Result<(), ScopeError> {
        validate_identifier(&self.table)?;
        validate_identifier(&self.id_column)?;
        validate_identifier(&self.deleted_column)?;
        for (column, _) in &self.predicates {
            validate_identifier(column)?;
        }
        Ok(())
    }

    pub fn to_sql(&self, dialect: SqlDialect) -> Result<SqlResult, ScopeError> {
        self.validate()?;
        let id_column = dialect.quote(&self.id_column);
        let mut sql = ScopedSql::new(
            format!("SELECT {} FROM {}", id_column, dialect.quote(&self.table)),
            vec![],
            dialect,
        );
        sql.where_eq(&self.id_column, self.id).and_is_null(&self.deleted_column);
        for (column, value) in &self.predicates {
            sql.and_eq(column, *value);
        }
        Ok(sql.finish())
    }
}

/// Check that `id` names a live row of `table` inside `scope`.
///
/// Fails closed: a malformed id, an invalid identifier or a store error all yield `false`.
pub async fn verify_record_in_scope<S, T>(
    store: &S,
    table: &str,
    id: &T,
    scope: &Scope,
    options: &VerifyOptions,
) -> bool
where
    S: ScopeStore + ?Sized,
    T: IdentifierSource + ?Sized,
{
    let Some(id) = to_id_or_null(id) else {
        debug!("Scope check on {} skipped: malformed identifier", table);
        return false;
    };

    let probe = RecordProbe::new(table, id, scope, options);
    if let Err(e) = probe.validate() {
        error!("Scope check on {} rejected: {}", table, e);
        return false;
    }

    match store.record_exists(&probe).await {
        Ok(found) => {
            if !found {
                debug!("Record {}#{} not found in scope {:?}", table, id, scope);
            }
            found
        }
        Err(e) => {
            error!("Scope check on {}#{} failed: {}", table, id, e);
            false
        }
    }
}

/// Outcome of verifying several ids against one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchVerdict {
    Accepted(Vec<i64>),
    /// The whole batch is rejected at the first id outside the scope
    Rejected { index: usize, raw: Value },
}

impl BatchVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, BatchVerdict::Accepted(_))
    }
}

/// Verify ids one round-trip at a time, stopping at the first miss
pub async fn verify_records_in_scope<S, T>(
    store: &S,
    table: &str,
    ids: &[T],
    scope: &Scope,
    options: &VerifyOptions,
) -> BatchVerdict
where
    S: ScopeStore + ?Sized,
    T: IdentifierSource + Into<Value> + Clone,
{
    let mut accepted = Vec::with_capacity(ids.len());
    for (index, raw) in ids.iter().enumerate() {
        let verified = match to_id_or_null(raw) {
            Some(id) => verify_record_in_scope(store, table, &id, scope, options)
                .await
                .then_some(id),
            None => None,
        };
        match verified {
            Some(id) => accepted.push(id),
            None => {
                return BatchVerdict::Rejected {
                    index,
                    raw: raw.clone().into(),
                }
            }
        }
    }
    BatchVerdict::Accepted(accepted)
}

/// Verify a client-supplied id, mapping every miss to 404. Malformed, missing and
/// out-of-scope ids all produce the same response.
pub async fn ensure_record_in_scope<S, T>(
    store: &S,
    table: &str,
    id: &T,
    scope: &Scope,
    options: &VerifyOptions,
    entity: &str,
) -> Result<i64, ApiError>
where
    S: ScopeStore + ?Sized,
    T: IdentifierSource + ?Sized,
{
    let not_found = || ApiError::not_found(format!("{} not found in the selected context", entity));
    let id = to_id_or_null(id).ok_or_else(not_found)?;
    if verify_record_in_scope(store, table, &id, scope, options).await {
        Ok(id)
    } else {
        Err(not_found())
    }
}
