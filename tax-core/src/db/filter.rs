//! Query filters and projections.
//!
//! A [`Filter`] is a conjunction of [`Clause`]s, each comparing one field
//! against a value with a [`Condition`]. Keys may address nested objects
//! with dots (`address.city`); `_id` addresses the store-assigned id.
//!
//! Filters are plain values: build one per query and hand it to a
//! [`DocumentCollection`](super::DocumentCollection).

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use super::document::{Document, ID_FIELD};
use super::store::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equal(Value),
    NotEqual(Value),
    GreaterThan(Value),
    GreaterOrEqual(Value),
    LessThan(Value),
    LessOrEqual(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    /// Inclusive on both ends.
    Between { min: Value, max: Value },
}

impl Condition {
    /// Evaluates the condition against a field value (`None` when absent).
    ///
    /// Equality treats a missing field as `null`. Ordering comparisons only
    /// hold between two numbers, two strings or two booleans.
    pub fn matches(
        &self,
        field: Option<&Value>,
    ) -> bool {
        match self {
            Condition::Equal(v) => field_equals(field, v),
            Condition::NotEqual(v) => !field_equals(field, v),
            Condition::GreaterThan(v) => compare(field, v) == Some(Ordering::Greater),
            Condition::GreaterOrEqual(v) => {
                matches!(compare(field, v), Some(Ordering::Greater | Ordering::Equal))
            }
            Condition::LessThan(v) => compare(field, v) == Some(Ordering::Less),
            Condition::LessOrEqual(v) => {
                matches!(compare(field, v), Some(Ordering::Less | Ordering::Equal))
            }
            Condition::In(values) => values.iter().any(|v| field_equals(field, v)),
            Condition::NotIn(values) => !values.iter().any(|v| field_equals(field, v)),
            Condition::Between { min, max } => {
                Condition::GreaterOrEqual(min.clone()).matches(field)
                    && Condition::LessOrEqual(max.clone()).matches(field)
            }
        }
    }
}

fn field_equals(
    field: Option<&Value>,
    expected: &Value,
) -> bool {
    match (field, expected) {
        (None | Some(Value::Null), Value::Null) => true,
        (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Some(actual), expected) => actual == expected,
        (None, _) => false,
    }
}

fn compare(
    field: Option<&Value>,
    bound: &Value,
) -> Option<Ordering> {
    match (field?, bound) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

impl fmt::Display for Condition {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Condition::Equal(v) => write!(f, "{{$eq: {v}}}"),
            Condition::NotEqual(v) => write!(f, "{{$ne: {v}}}"),
            Condition::GreaterThan(v) => write!(f, "{{$gt: {v}}}"),
            Condition::GreaterOrEqual(v) => write!(f, "{{$gte: {v}}}"),
            Condition::LessThan(v) => write!(f, "{{$lt: {v}}}"),
            Condition::LessOrEqual(v) => write!(f, "{{$lte: {v}}}"),
            Condition::In(vs) => write!(f, "{{$in: {}}}", Value::Array(vs.clone())),
            Condition::NotIn(vs) => write!(f, "{{$nin: {}}}", Value::Array(vs.clone())),
            Condition::Between { min, max } => write!(f, "{{$gte: {min}, $lte: {max}}}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub key: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// A single-clause filter.
    pub fn new(
        key: impl Into<String>,
        condition: Condition,
    ) -> Self {
        Self::all().and(key, condition)
    }

    pub fn and(
        mut self,
        key: impl Into<String>,
        condition: Condition,
    ) -> Self {
        self.clauses.push(Clause {
            key: key.into(),
            condition,
        });
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Checks every key is non-empty and made of `[A-Za-z0-9_]` segments
    /// separated by single dots.
    pub fn validate(&self) -> Result<(), StoreError> {
        for clause in &self.clauses {
            validate_key(&clause.key)?;
        }
        Ok(())
    }

    pub fn matches(
        &self,
        doc: &Document,
    ) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.condition.matches(lookup(doc, &clause.key)))
    }
}

impl fmt::Display for Filter {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{{")?;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", clause.key, clause.condition)?;
        }
        write!(f, "}}")
    }
}

pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidFilter(format!("invalid key '{key}'")))
    }
}

/// Resolves a dotted key inside `doc`.
pub fn lookup<'a>(
    doc: &'a Document,
    key: &str,
) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Which fields `find` returns.
///
/// `Include` keeps the listed fields plus `_id`; `Exclude` drops the listed
/// fields (list `_id` to drop the id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Include(Vec<String>),
    Exclude(Vec<String>),
}

impl Projection {
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Include(fields.into_iter().map(Into::into).collect())
    }

    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Exclude(fields.into_iter().map(Into::into).collect())
    }

    /// Every stored field, without `_id`.
    pub fn without_id() -> Self {
        Projection::exclude([ID_FIELD])
    }

    pub fn apply(
        &self,
        mut doc: Document,
    ) -> Document {
        match self {
            Projection::Include(fields) => {
                doc.retain(|key, _| key == ID_FIELD || fields.iter().any(|f| f == key));
                doc
            }
            Projection::Exclude(fields) => {
                for field in fields {
                    doc.remove(field);
                }
                doc
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn person(age: i64) -> Document {
        doc(json!({
            "_id": 1,
            "name": "Ona",
            "age": age,
            "anual_salary_before_tax": 30000.5,
            "address": {"city": "Kaunas"},
        }))
    }

    #[test]
    fn comparison_conditions() {
        let d = person(30);

        assert!(Filter::new("age", Condition::Equal(json!(30))).matches(&d));
        assert!(Filter::new("age", Condition::Equal(json!(30.0))).matches(&d));
        assert!(Filter::new("age", Condition::NotEqual(json!(31))).matches(&d));
        assert!(Filter::new("age", Condition::GreaterThan(json!(29))).matches(&d));
        assert!(!Filter::new("age", Condition::GreaterThan(json!(30))).matches(&d));
        assert!(Filter::new("age", Condition::GreaterOrEqual(json!(30))).matches(&d));
        assert!(Filter::new("age", Condition::LessThan(json!(31))).matches(&d));
        assert!(!Filter::new("age", Condition::LessThan(json!(30))).matches(&d));
        assert!(Filter::new("age", Condition::LessOrEqual(json!(30))).matches(&d));
    }

    #[test]
    fn set_conditions() {
        let d = person(30);

        assert!(Filter::new("age", Condition::In(vec![json!(18), json!(30)])).matches(&d));
        assert!(!Filter::new("age", Condition::In(vec![])).matches(&d));
        assert!(Filter::new("age", Condition::NotIn(vec![json!(18)])).matches(&d));
        assert!(!Filter::new("age", Condition::NotIn(vec![json!(30)])).matches(&d));
    }

    #[test]
    fn between_is_inclusive() {
        let range = Filter::new(
            "age",
            Condition::Between {
                min: json!(20),
                max: json!(30),
            },
        );

        assert!(range.matches(&person(20)));
        assert!(range.matches(&person(30)));
        assert!(!range.matches(&person(31)));
        assert!(!range.matches(&person(19)));
    }

    #[test]
    fn missing_field_equals_null_only() {
        let d = person(30);

        assert!(Filter::new("title", Condition::Equal(Value::Null)).matches(&d));
        assert!(Filter::new("title", Condition::NotEqual(json!("Dr"))).matches(&d));
        assert!(!Filter::new("title", Condition::GreaterThan(json!(0))).matches(&d));
    }

    #[test]
    fn mixed_types_never_order() {
        let d = person(30);

        assert!(!Filter::new("name", Condition::GreaterThan(json!(5))).matches(&d));
        assert!(!Filter::new("age", Condition::LessThan(json!("z"))).matches(&d));
    }

    #[test]
    fn nested_keys_and_conjunction() {
        let filter = Filter::new("address.city", Condition::Equal(json!("Kaunas")))
            .and("age", Condition::GreaterOrEqual(json!(18)));

        assert!(filter.matches(&person(30)));
        assert!(!filter.matches(&person(17)));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::all().matches(&Document::new()));
    }

    #[test]
    fn validate_rejects_malformed_keys() {
        for key in ["", "a..b", ".age", "age.", "age; DROP", "na me", "$where"] {
            assert!(
                Filter::new(key, Condition::Equal(json!(1))).validate().is_err(),
                "key {key:?} should be rejected"
            );
        }
        assert!(
            Filter::new("_id", Condition::Equal(json!(1)))
                .and("address.city", Condition::Equal(json!("x")))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn display_reads_like_a_query() {
        let filter = Filter::new(
            "age",
            Condition::Between {
                min: json!(18),
                max: json!(30),
            },
        );

        assert_eq!(filter.to_string(), "{age: {$gte: 18, $lte: 30}}");
    }

    #[test]
    fn include_projection_keeps_id() {
        let projected = Projection::include(["name"]).apply(person(30));

        assert_eq!(Value::Object(projected), json!({"_id": 1, "name": "Ona"}));
    }

    #[test]
    fn exclude_projection_drops_fields() {
        let projected = Projection::exclude(["address", "anual_salary_before_tax"])
            .apply(person(30));

        assert_eq!(
            Value::Object(projected),
            json!({"_id": 1, "name": "Ona", "age": 30})
        );
        assert!(!Projection::without_id().apply(person(1)).contains_key("_id"));
    }
}
