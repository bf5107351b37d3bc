//! Translation of [`Filter`]s into SQL over the `documents` table.
//!
//! Fields are read with `json_extract(body, '$.<key>')`; `_id` maps to the
//! `id` column. Equality uses `IS`/`IS NOT` so a missing field compares as
//! `NULL`, matching the in-memory backend. Ordering comparisons only match
//! fields whose JSON type agrees with the bound.

use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite};
use tax_core::db::{Clause, Condition, Filter, ID_FIELD};

fn push_field(
    qb: &mut QueryBuilder<'_, Sqlite>,
    key: &str,
) {
    if key == ID_FIELD {
        qb.push("id");
    } else {
        qb.push("json_extract(body, ")
            .push_bind(format!("$.{key}"))
            .push(")");
    }
}

/// Binds a JSON scalar as the matching SQLite type. Arrays and objects are
/// bound as their JSON text, which is what `json_extract` returns for them.
fn push_value(
    qb: &mut QueryBuilder<'_, Sqlite>,
    value: &Value,
) {
    match value {
        Value::Null => qb.push_bind(None::<String>),
        Value::Bool(b) => qb.push_bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => qb.push_bind(i),
            None => qb.push_bind(n.as_f64()),
        },
        Value::String(s) => qb.push_bind(s.clone()),
        other => qb.push_bind(other.to_string()),
    };
}

fn push_comparison(
    qb: &mut QueryBuilder<'_, Sqlite>,
    key: &str,
    operator: &str,
    value: &Value,
) {
    push_field(qb, key);
    qb.push(operator);
    push_value(qb, value);
}

/// `json_type` names compatible with an ordering bound, or `None` when the
/// bound cannot be ordered against anything.
fn ordered_types(bound: &Value) -> Option<&'static str> {
    match bound {
        Value::Number(_) => Some("('integer','real')"),
        Value::String(_) => Some("('text')"),
        Value::Bool(_) => Some("('true','false')"),
        _ => None,
    }
}

/// `(type(f) IN (...) AND f <op> v)`; `0` for null, array or object bounds.
fn push_ordered(
    qb: &mut QueryBuilder<'_, Sqlite>,
    key: &str,
    operator: &str,
    bound: &Value,
) {
    let Some(types) = ordered_types(bound) else {
        qb.push("0");
        return;
    };
    qb.push("(");
    if key == ID_FIELD {
        qb.push("typeof(id)");
    } else {
        qb.push("json_type(body, ")
            .push_bind(format!("$.{key}"))
            .push(")");
    }
    qb.push(" IN ").push(types).push(" AND ");
    push_comparison(qb, key, operator, bound);
    qb.push(")");
}

/// `(f IS a OR f IS b ...)`; an empty set is `0`.
fn push_any_equal(
    qb: &mut QueryBuilder<'_, Sqlite>,
    key: &str,
    values: &[Value],
) {
    if values.is_empty() {
        qb.push("0");
        return;
    }
    qb.push("(");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        push_comparison(qb, key, " IS ", value);
    }
    qb.push(")");
}

fn push_clause(
    qb: &mut QueryBuilder<'_, Sqlite>,
    clause: &Clause,
) {
    let key = clause.key.as_str();
    match &clause.condition {
        Condition::Equal(v) => push_comparison(qb, key, " IS ", v),
        Condition::NotEqual(v) => push_comparison(qb, key, " IS NOT ", v),
        Condition::GreaterThan(v) => push_ordered(qb, key, " > ", v),
        Condition::GreaterOrEqual(v) => push_ordered(qb, key, " >= ", v),
        Condition::LessThan(v) => push_ordered(qb, key, " < ", v),
        Condition::LessOrEqual(v) => push_ordered(qb, key, " <= ", v),
        Condition::In(values) => push_any_equal(qb, key, values),
        Condition::NotIn(values) => {
            qb.push("NOT ");
            push_any_equal(qb, key, values);
        }
        Condition::Between { min, max } => {
            qb.push("(");
            push_ordered(qb, key, " >= ", min);
            qb.push(" AND ");
            push_ordered(qb, key, " <= ", max);
            qb.push(")");
        }
    }
}

/// Appends ` WHERE namespace = ? AND <clause> AND ...`. The filter must
/// already be validated.
pub(crate) fn push_where(
    qb: &mut QueryBuilder<'_, Sqlite>,
    namespace: &str,
    filter: &Filter,
) {
    qb.push(" WHERE namespace = ").push_bind(namespace.to_string());
    for clause in filter.clauses() {
        qb.push(" AND ");
        push_clause(qb, clause);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn sql_for(filter: &Filter) -> String {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id FROM documents");
        push_where(&mut qb, "taxes.people", filter);
        qb.sql().to_string()
    }

    #[test]
    fn between_uses_inclusive_bounds() {
        let filter = Filter::new(
            "age",
            Condition::Between {
                min: json!(18),
                max: json!(30),
            },
        );

        assert_eq!(
            sql_for(&filter),
            "SELECT id FROM documents WHERE namespace = ? AND \
             ((json_type(body, ?) IN ('integer','real') AND json_extract(body, ?) >= ?) AND \
             (json_type(body, ?) IN ('integer','real') AND json_extract(body, ?) <= ?))"
        );
    }

    #[test]
    fn ordering_guards_on_bound_type() {
        let by_name = Filter::new("name", Condition::LessThan(json!("M")));
        let by_id = Filter::new("_id", Condition::GreaterThan(json!(2)));

        assert!(sql_for(&by_name).ends_with(
            "AND (json_type(body, ?) IN ('text') AND json_extract(body, ?) < ?)"
        ));
        assert!(sql_for(&by_id).ends_with("AND (typeof(id) IN ('integer','real') AND id > ?)"));
        assert!(sql_for(&Filter::new("age", Condition::GreaterThan(Value::Null))).ends_with("AND 0"));
    }

    #[test]
    fn id_key_targets_column() {
        let filter = Filter::new("_id", Condition::Equal(json!(3)));

        assert_eq!(
            sql_for(&filter),
            "SELECT id FROM documents WHERE namespace = ? AND id IS ?"
        );
    }

    #[test]
    fn empty_sets() {
        assert!(sql_for(&Filter::new("age", Condition::In(vec![]))).ends_with("AND 0"));
        assert!(sql_for(&Filter::new("age", Condition::NotIn(vec![]))).ends_with("AND NOT 0"));
    }

    #[test]
    fn not_in_negates_disjunction() {
        let filter = Filter::new("age", Condition::NotIn(vec![json!(1), json!(2)]));

        assert!(sql_for(&filter).ends_with(
            "AND NOT (json_extract(body, ?) IS ? OR json_extract(body, ?) IS ?)"
        ));
    }

    #[test]
    fn empty_filter_scopes_to_namespace_only() {
        assert_eq!(
            sql_for(&Filter::all()),
            "SELECT id FROM documents WHERE namespace = ?"
        );
    }
}
