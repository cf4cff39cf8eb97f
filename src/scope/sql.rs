use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::{Scope, ScopeDimension};
use super::error::ScopeError;

/// Placeholder and identifier conventions of the target store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// `?` placeholders, bare identifiers
    #[default]
    MySql,
    /// `$n` placeholders, double-quoted identifiers
    Postgres,
}

impl SqlDialect {
    pub fn quote(&self, identifier: &str) -> String {
        match self {
            SqlDialect::MySql => identifier.to_string(),
            SqlDialect::Postgres => format!("\"{}\"", identifier.replace('"', "\"\"")),
        }
    }

    /// Placeholder for the 1-based parameter position `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::MySql => "?".to_string(),
            SqlDialect::Postgres => format!("${}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

/// Raw SQL plus its bound parameters. Every predicate that carries a value is
/// appended together with that value, so clause and parameter counts cannot drift.
#[derive(Debug, Clone)]
pub struct ScopedSql {
    query: String,
    params: Vec<Value>,
    dialect: SqlDialect,
    alias: Option<String>,
}

impl ScopedSql {
    pub fn new(query: impl Into<String>, params: Vec<Value>, dialect: SqlDialect) -> Self {
        Self {
            query: query.into(),
            params,
            dialect,
            alias: None,
        }
    }

    /// Qualify subsequent columns with a table alias
    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.push_eq("WHERE", column, value.into())
    }

    pub fn and_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.push_eq("AND", column, value.into())
    }

    pub fn and_is_null(&mut self, column: &str) -> &mut Self {
        let column = self.column(column);
        self.query.push_str(&format!(" AND {} IS NULL", column));
        self
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn finish(self) -> SqlResult {
        SqlResult {
            query: self.query,
            params: self.params,
        }
    }

    fn push_eq(&mut self, keyword: &str, column: &str, value: Value) -> &mut Self {
        let column = self.column(column);
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.query.push_str(&format!(" {} {} = {}", keyword, column, placeholder));
        self
    }

    fn column(&self, column: &str) -> String {
        let quoted = self.dialect.quote(column);
        match &self.alias {
            Some(alias) => format!("{}.{}", self.dialect.quote(alias), quoted),
            None => quoted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqlScopeOptions {
    pub use_branch: bool,
    pub use_course: bool,
    pub branch_column: String,
    pub course_column: String,
    pub table_alias: Option<String>,
    pub dialect: SqlDialect,
}

impl Default for SqlScopeOptions {
    fn default() -> Self {
        Self {
            use_branch: true,
            use_course: true,
            branch_column: ScopeDimension::Branch.key().to_string(),
            course_column: ScopeDimension::Course.key().to_string(),
            table_alias: None,
            dialect: SqlDialect::default(),
        }
    }
}

impl SqlScopeOptions {
    pub fn school_only() -> Self {
        Self {
            use_branch: false,
            use_course: false,
            ..Self::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.table_alias = Some(alias.into());
        self
    }

    pub fn course_column(mut self, column: impl Into<String>) -> Self {
        self.course_column = column.into();
        self
    }

    pub fn dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }
}

/// Append `AND <col> = ?` predicates for every set, enabled scope component
pub fn append_scope_to_sql(
    sql: impl Into<String>,
    params: Vec<Value>,
    scope: &Scope,
    options: &SqlScopeOptions,
) -> SqlResult {
    let mut builder =
        ScopedSql::new(sql, params, options.dialect).with_alias(options.table_alias.clone());
    for (dimension, id) in scope.components(options.use_branch, options.use_course) {
        let column = match dimension {
            ScopeDimension::School => ScopeDimension::School.key(),
            ScopeDimension::Branch => options.branch_column.as_str(),
            ScopeDimension::Course => options.course_column.as_str(),
        };
        builder.and_eq(column, id);
    }
    builder.finish()
}

/// Table, column and alias names must be plain identifiers before they are spliced into SQL
pub fn validate_identifier(name: &str) -> Result<(), ScopeError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ScopeError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FLAG_COMBINATIONS: [(bool, bool); 4] =
        [(false, false), (true, false), (false, true), (true, true)];

    fn full_scope() -> Scope {
        Scope::new(Some(5), Some(6), Some(7))
    }

    #[test]
    fn appends_all_components_in_order() {
        let result = append_scope_to_sql(
            "SELECT * FROM payments WHERE deletedAt IS NULL",
            vec![],
            &full_scope(),
            &SqlScopeOptions::default(),
        );
        assert_eq!(
            result.query,
            "SELECT * FROM payments WHERE deletedAt IS NULL \
             AND schoolId = ? AND branchId = ? AND courseId = ?"
        );
        assert_eq!(result.params, vec![json!(5), json!(6), json!(7)]);
    }

    #[test]
    fn keeps_existing_params_ahead_of_scope_params() {
        let result = append_scope_to_sql(
            "SELECT c.id FROM classes c WHERE c.id = ?",
            vec![json!(44)],
            &full_scope(),
            &SqlScopeOptions::school_only().alias("c"),
        );
        assert_eq!(
            result.query,
            "SELECT c.id FROM classes c WHERE c.id = ? AND c.schoolId = ?"
        );
        assert_eq!(result.params, vec![json!(44), json!(5)]);
    }

    #[test]
    fn honours_custom_course_column() {
        let scope = Scope::new(Some(1), None, Some(9));
        let result = append_scope_to_sql(
            "UPDATE enrollments SET status = ? WHERE id = ?",
            vec![json!("active"), json!(3)],
            &scope,
            &SqlScopeOptions::default().course_column("classCourseId"),
        );
        assert_eq!(
            result.query,
            "UPDATE enrollments SET status = ? WHERE id = ? AND schoolId = ? AND classCourseId = ?"
        );
        assert_eq!(result.params.len(), 4);
    }

    #[test]
    fn postgres_numbering_continues_from_existing_params() {
        let result = append_scope_to_sql(
            "SELECT * FROM \"customers\" WHERE \"id\" = $1",
            vec![json!(10)],
            &full_scope(),
            &SqlScopeOptions::default().dialect(SqlDialect::Postgres).alias("cu"),
        );
        assert_eq!(
            result.query,
            "SELECT * FROM \"customers\" WHERE \"id\" = $1 AND \"cu\".\"schoolId\" = $2 \
             AND \"cu\".\"branchId\" = $3 AND \"cu\".\"courseId\" = $4"
        );
        assert_eq!(result.params, vec![json!(10), json!(5), json!(6), json!(7)]);
    }

    #[test]
    fn placeholder_count_matches_params_for_every_flag_combination() {
        let scopes = [
            Scope::default(),
            Scope::new(Some(1), None, None),
            Scope::new(Some(1), Some(2), None),
            Scope::new(Some(1), None, Some(3)),
            full_scope(),
        ];
        for scope in scopes.iter() {
            for (use_branch, use_course) in FLAG_COMBINATIONS {
                let options = SqlScopeOptions {
                    use_branch,
                    use_course,
                    ..SqlScopeOptions::default()
                };
                let base = "SELECT 1 FROM t WHERE a = ?";
                let result = append_scope_to_sql(base, vec![json!("a")], scope, &options);
                let placeholders = result.query.matches('?').count();
                assert_eq!(
                    placeholders,
                    result.params.len(),
                    "drift for {:?} {:?}",
                    scope,
                    options
                );
            }
        }
    }

    #[test]
    fn empty_scope_leaves_sql_untouched() {
        let options = SqlScopeOptions::default();
        let result = append_scope_to_sql("SELECT 1", vec![], &Scope::default(), &options);
        assert_eq!(result.query, "SELECT 1");
        assert!(result.params.is_empty());
    }

    #[test]
    fn builder_tracks_params_as_predicates_are_added() {
        let base = "SELECT 1 FROM t WHERE a = $1";
        let mut sql = ScopedSql::new(base, vec![json!("a")], SqlDialect::Postgres);
        assert_eq!(sql.param_count(), 1);

        sql.and_eq("schoolId", 5).and_is_null("deletedAt");
        assert_eq!(sql.param_count(), 2);
        assert_eq!(sql.dialect(), SqlDialect::Postgres);

        let result = sql.finish();
        assert_eq!(
            result.query,
            "SELECT 1 FROM t WHERE a = $1 AND \"schoolId\" = $2 AND \"deletedAt\" IS NULL"
        );
    }

    #[test]
    fn rejects_non_identifiers() {
        assert!(validate_identifier("fee_items").is_ok());
        assert!(validate_identifier("_hidden").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1table").is_err());
        assert!(validate_identifier("users; DROP TABLE users").is_err());
        assert!(validate_identifier("a.b").is_err());
    }
}
