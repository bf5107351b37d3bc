//! JSON documents and the helpers every backend shares for them.

use std::fmt;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::store::StoreError;

/// A stored record: a JSON object.
pub type Document = serde_json::Map<String, Value>;

/// Key under which `find` reports the store-assigned id.
pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl DocumentId {
    /// Reads the id `find` attached to `doc`, if any.
    pub fn of(doc: &Document) -> Option<Self> {
        doc.get(ID_FIELD).and_then(Value::as_i64).map(DocumentId)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: &Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc.clone()))?)
}

/// Rejects documents that try to set the store-assigned id.
pub fn check_insertable(doc: &Document) -> Result<(), StoreError> {
    if doc.contains_key(ID_FIELD) {
        return Err(StoreError::InvalidDocument(format!(
            "'{ID_FIELD}' is assigned by the store"
        )));
    }
    Ok(())
}

/// Rejects empty patches and patches touching the id.
pub fn check_patch(patch: &Document) -> Result<(), StoreError> {
    if patch.is_empty() {
        return Err(StoreError::InvalidDocument("update patch is empty".to_string()));
    }
    if patch.contains_key(ID_FIELD) {
        return Err(StoreError::InvalidDocument(format!(
            "'{ID_FIELD}' cannot be updated"
        )));
    }
    Ok(())
}

/// Overwrites the fields of `target` named in `patch`. Returns whether any
/// value actually changed.
pub fn merge_patch(
    target: &mut Document,
    patch: &Document,
) -> bool {
    let mut changed = false;
    for (key, value) in patch {
        if target.get(key) != Some(value) {
            target.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
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

    #[test]
    fn merge_patch_overwrites_named_fields_only() {
        let mut target = doc(json!({"name": "Ona", "age": 30, "city": "Vilnius"}));

        let changed = merge_patch(&mut target, &doc(json!({"age": 31, "title": "Dr"})));

        assert!(changed);
        assert_eq!(
            Value::Object(target),
            json!({"name": "Ona", "age": 31, "city": "Vilnius", "title": "Dr"})
        );
    }

    #[test]
    fn merge_patch_reports_no_change_for_equal_values() {
        let mut target = doc(json!({"age": 30}));

        assert!(!merge_patch(&mut target, &doc(json!({"age": 30}))));
    }

    #[test]
    fn id_of_reads_integer_id() {
        assert_eq!(DocumentId::of(&doc(json!({"_id": 4}))), Some(DocumentId(4)));
        assert_eq!(DocumentId::of(&doc(json!({"name": "x"}))), None);
    }

    #[test]
    fn insert_with_id_is_rejected() {
        assert!(matches!(
            check_insertable(&doc(json!({"_id": 1}))),
            Err(StoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn empty_or_id_patch_is_rejected() {
        assert!(check_patch(&Document::new()).is_err());
        assert!(check_patch(&doc(json!({"_id": 2}))).is_err());
        assert!(check_patch(&doc(json!({"age": 2}))).is_ok());
    }

    #[test]
    fn to_document_rejects_non_objects() {
        assert!(matches!(
            to_document(&5),
            Err(StoreError::InvalidDocument(_))
        ));
    }
}
