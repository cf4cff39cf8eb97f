use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// The (school, branch, course) slice a request is allowed to see
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub school_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub course_id: Option<i64>,
    pub derived_branch_from_course: bool,
}

/// One level of the school → branch → course hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeDimension {
    School,
    Branch,
    Course,
}

impl ScopeDimension {
    /// Canonical filter key / column name for this dimension
    pub fn key(&self) -> &'static str {
        match self {
            ScopeDimension::School => "schoolId",
            ScopeDimension::Branch => "branchId",
            ScopeDimension::Course => "courseId",
        }
    }
}

impl fmt::Display for ScopeDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeDimension::School => write!(f, "school"),
            ScopeDimension::Branch => write!(f, "branch"),
            ScopeDimension::Course => write!(f, "course"),
        }
    }
}

impl Scope {
    pub fn new(school_id: Option<i64>, branch_id: Option<i64>, course_id: Option<i64>) -> Self {
        Self {
            school_id,
            branch_id,
            course_id,
            derived_branch_from_course: false,
        }
    }

    pub fn get(&self, dimension: ScopeDimension) -> Option<i64> {
        match dimension {
            ScopeDimension::School => self.school_id,
            ScopeDimension::Branch => self.branch_id,
            ScopeDimension::Course => self.course_id,
        }
    }

    /// Scope components that are both set and enabled, in school → branch → course order.
    /// The school component is always enabled.
    pub fn components(
        &self,
        use_branch: bool,
        use_course: bool,
    ) -> impl Iterator<Item = (ScopeDimension, i64)> {
        let enabled = [
            (ScopeDimension::School, true),
            (ScopeDimension::Branch, use_branch),
            (ScopeDimension::Course, use_course),
        ];
        let scope = *self;
        enabled
            .into_iter()
            .filter(|(_, on)| *on)
            .filter_map(move |(dimension, _)| scope.get(dimension).map(|id| (dimension, id)))
    }
}

/// Default identifiers of the authenticated user, as handed over by the auth layer.
/// Values are raw JSON because they arrive as strings or numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeUser {
    #[serde(default)]
    pub school_id: Value,
    #[serde(default)]
    pub branch_id: Value,
    #[serde(default)]
    pub course_id: Value,
}

impl ScopeUser {
    pub fn new(
        school_id: impl Into<Value>,
        branch_id: impl Into<Value>,
        course_id: impl Into<Value>,
    ) -> Self {
        Self {
            school_id: school_id.into(),
            branch_id: branch_id.into(),
            course_id: course_id.into(),
        }
    }
}

/// Per-request override of the user's defaults.
///
/// Each field distinguishes an absent key (`None`: keep the user default) from a
/// present key (`Some(value)`), where `Some(Value::Null)` explicitly clears the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedContext {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub school_id: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub course_id: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ManagedContext {
    pub fn with_school_id(mut self, value: impl Into<Value>) -> Self {
        self.school_id = Some(value.into());
        self
    }

    pub fn with_branch_id(mut self, value: impl Into<Value>) -> Self {
        self.branch_id = Some(value.into());
        self
    }

    pub fn with_course_id(mut self, value: impl Into<Value>) -> Self {
        self.course_id = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.school_id.is_none() && self.branch_id.is_none() && self.course_id.is_none()
    }

    fn field(&self, dimension: ScopeDimension) -> Option<&Value> {
        match dimension {
            ScopeDimension::School => self.school_id.as_ref(),
            ScopeDimension::Branch => self.branch_id.as_ref(),
            ScopeDimension::Course => self.course_id.as_ref(),
        }
    }
}

/// Request-scoped input to scope resolution. Owned by a single request; the
/// resolved scope is cached here and never shared across requests.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: ScopeUser,
    pub managed: Option<ManagedContext>,
    resolved: Option<Scope>,
}

impl RequestContext {
    pub fn new(user: ScopeUser, managed: Option<ManagedContext>) -> Self {
        Self {
            user,
            managed,
            resolved: None,
        }
    }

    /// Raw value for a dimension: the override when its key is present, else the user default
    pub fn raw_value(&self, dimension: ScopeDimension) -> &Value {
        if let Some(value) = self.managed.as_ref().and_then(|m| m.field(dimension)) {
            return value;
        }
        match dimension {
            ScopeDimension::School => &self.user.school_id,
            ScopeDimension::Branch => &self.user.branch_id,
            ScopeDimension::Course => &self.user.course_id,
        }
    }

    pub fn cached_scope(&self) -> Option<Scope> {
        self.resolved
    }

    pub(crate) fn cache_scope(&mut self, scope: Scope) {
        self.resolved = Some(scope);
    }
}
