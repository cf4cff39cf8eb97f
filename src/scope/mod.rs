//! Scope resolution and enforcement: every query and mutation is confined to the
//! caller's school, optionally narrowed to a branch and a course.

pub mod coerce;
pub mod context;
pub mod error;
pub mod guard;
pub mod resolver;
pub mod sql;
pub mod verify;
pub mod where_clause;

pub use coerce::{to_id_or_null, to_id_safe, IdentifierSource};
pub use context::{ManagedContext, RequestContext, Scope, ScopeDimension, ScopeUser};
pub use error::ScopeError;
pub use guard::{
    normalize_scope_with_school, reconcile_requested_ids, require_school, resolve_required_scope,
    ScopedIds,
};
pub use resolver::{resolve_managed_scope, ResolveOptions};
pub use sql::{append_scope_to_sql, ScopedSql, SqlDialect, SqlResult, SqlScopeOptions};
pub use verify::{
    ensure_record_in_scope, verify_record_in_scope, verify_records_in_scope, BatchVerdict,
    RecordProbe, VerifyOptions,
};
pub use where_clause::{apply_scope_to_where, WhereScopeOptions};
