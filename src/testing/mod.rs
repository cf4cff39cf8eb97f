use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::database::{DatabaseError, ScopeStore};
use crate::scope::{to_id_or_null, RecordProbe};

/// In-memory `ScopeStore` that evaluates probes against JSON rows
#[derive(Default)]
pub struct MemoryScopeStore {
    courses: HashMap<i64, Option<i64>>,
    tables: HashMap<String, Vec<Map<String, Value>>>,
    fail_course_lookup: bool,
    fail_queries: bool,
    course_lookups: AtomicUsize,
    probes: Mutex<Vec<RecordProbe>>,
}

impl MemoryScopeStore {
    pub fn with_course(mut self, course_id: i64, branch_id: Option<i64>) -> Self {
        self.courses.insert(course_id, branch_id);
        self
    }

    pub fn with_row(mut self, table: &str, row: Value) -> Self {
        if let Value::Object(map) = row {
            self.tables.entry(table.to_string()).or_default().push(map);
        }
        self
    }

    pub fn failing_course_lookup(mut self) -> Self {
        self.fail_course_lookup = true;
        self
    }

    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    pub fn course_lookups(&self) -> usize {
        self.course_lookups.load(Ordering::SeqCst)
    }

    /// Probes seen so far, in order
    pub fn probes(&self) -> Vec<RecordProbe> {
        self.probes.lock().map(|probes| probes.to_vec()).unwrap_or_default()
    }

    fn matches(row: &Map<String, Value>, probe: &RecordProbe) -> bool {
        let column_is =
            |column: &str, expected: i64| row.get(column).and_then(to_id_or_null) == Some(expected);
        column_is(probe.id_column.as_str(), probe.id)
            && row.get(&probe.deleted_column).map_or(true, Value::is_null)
            && probe.predicates.iter().all(|(column, value)| column_is(column.as_str(), *value))
    }
}

#[async_trait]
impl ScopeStore for MemoryScopeStore {
    async fn course_branch_id(&self, course_id: i64) -> Result<Option<i64>, DatabaseError> {
        self.course_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_course_lookup {
            return Err(DatabaseError::QueryError("simulated course lookup failure".to_string()));
        }
        Ok(self.courses.get(&course_id).copied().flatten())
    }

    async fn record_exists(&self, probe: &RecordProbe) -> Result<bool, DatabaseError> {
        if let Ok(mut probes) = self.probes.lock() {
            probes.push(probe.clone());
        }
        if self.fail_queries {
            return Err(DatabaseError::QueryError("simulated query failure".to_string()));
        }
        Ok(self
            .tables
            .get(&probe.table)
            .map_or(false, |rows| rows.iter().any(|row| Self::matches(row, probe))))
    }
}
