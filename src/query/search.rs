use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::source::Where;

/// A searchable field, either on the model itself or one relation away
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchField {
    Field(String),
    Relation { relation: String, field: String },
}

impl SearchField {
    pub fn relation(relation: impl Into<String>, field: impl Into<String>) -> Self {
        SearchField::Relation {
            relation: relation.into(),
            field: field.into(),
        }
    }
}

impl From<&str> for SearchField {
    fn from(field: &str) -> Self {
        SearchField::Field(field.to_string())
    }
}

impl From<String> for SearchField {
    fn from(field: String) -> Self {
        SearchField::Field(field)
    }
}

/// Trimmed search term, or `None` when there is nothing to search for
fn normalized_term(term: Option<&str>) -> Option<&str> {
    term.map(str::trim).filter(|t| !t.is_empty())
}

/// Case-insensitive match condition for a single field. The matching mode is
/// declared, not applied; the data source interprets it.
fn insensitive_match(operator: &str, term: &str) -> Value {
    json!({ operator: term, "mode": "insensitive" })
}

fn single(field: &str, condition: Value) -> Value {
    let mut map = Where::new();
    map.insert(field.to_string(), condition);
    Value::Object(map)
}

fn disjunction(conditions: Vec<Value>) -> Where {
    let mut clause = Where::new();
    clause.insert("OR".to_string(), Value::Array(conditions));
    clause
}

fn build_match_query(operator: &str, term: Option<&str>, fields: &[&str]) -> Option<Where> {
    let term = normalized_term(term)?;
    if fields.is_empty() {
        return None;
    }

    let conditions = fields
        .iter()
        .map(|field| single(field, insensitive_match(operator, term)))
        .collect();

    Some(disjunction(conditions))
}

/// OR of case-insensitive "contains" conditions, one per field.
///
/// Returns `None` for a blank term or an empty field list.
pub fn build_search_query(term: Option<&str>, fields: &[&str]) -> Option<Where> {
    build_match_query("contains", term, fields)
}

/// Like [`build_search_query`] but relation-qualified fields nest their
/// condition one level under the relation name.
pub fn build_nested_search_query(term: Option<&str>, fields: &[SearchField]) -> Option<Where> {
    let term = normalized_term(term)?;
    if fields.is_empty() {
        return None;
    }

    let conditions = fields
        .iter()
        .map(|field| match field {
            SearchField::Field(name) => single(name, insensitive_match("contains", term)),
            SearchField::Relation { relation, field } => {
                single(relation, single(field, insensitive_match("contains", term)))
            }
        })
        .collect();

    Some(disjunction(conditions))
}

/// Single equality condition; `None` when either part is missing
pub fn build_exact_search(value: Option<&str>, field: Option<&str>) -> Option<Where> {
    let value = value.filter(|v| !v.is_empty())?;
    let field = field.filter(|f| !f.is_empty())?;

    let mut clause = Where::new();
    clause.insert(field.to_string(), Value::String(value.to_string()));
    Some(clause)
}

/// OR of case-insensitive "starts with" conditions, one per field
pub fn build_prefix_search(prefix: Option<&str>, fields: &[&str]) -> Option<Where> {
    build_match_query("startsWith", prefix, fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_shape() {
        let clause = build_search_query(Some("  john "), &["email", "name"]).unwrap();
        assert_eq!(
            Value::Object(clause),
            json!({"OR": [
                {"email": {"contains": "john", "mode": "insensitive"}},
                {"name": {"contains": "john", "mode": "insensitive"}}
            ]})
        );
    }

    #[test]
    fn test_search_query_empty_inputs() {
        assert_eq!(build_search_query(None, &["email"]), None);
        assert_eq!(build_search_query(Some(""), &["email"]), None);
        assert_eq!(build_search_query(Some("   "), &["email"]), None);
        assert_eq!(build_search_query(Some("x"), &[]), None);
    }

    #[test]
    fn test_nested_search_query() {
        let fields = vec![
            SearchField::from("title"),
            SearchField::relation("author", "name"),
        ];
        let clause = build_nested_search_query(Some("ada"), &fields).unwrap();

        assert_eq!(
            Value::Object(clause),
            json!({"OR": [
                {"title": {"contains": "ada", "mode": "insensitive"}},
                {"author": {"name": {"contains": "ada", "mode": "insensitive"}}}
            ]})
        );
        assert_eq!(build_nested_search_query(Some(" "), &fields), None);
        assert_eq!(build_nested_search_query(Some("ada"), &[]), None);
    }

    #[test]
    fn test_search_field_deserializes_both_shapes() {
        let fields: Vec<SearchField> =
            serde_json::from_value(json!(["title", {"relation": "author", "field": "name"}]))
                .unwrap();
        assert_eq!(fields[0], SearchField::from("title"));
        assert_eq!(fields[1], SearchField::relation("author", "name"));
    }

    #[test]
    fn test_exact_search() {
        let clause = build_exact_search(Some("SKU-1"), Some("sku")).unwrap();
        assert_eq!(Value::Object(clause), json!({"sku": "SKU-1"}));

        assert_eq!(build_exact_search(None, Some("sku")), None);
        assert_eq!(build_exact_search(Some("SKU-1"), None), None);
    }

    #[test]
    fn test_prefix_search() {
        let clause = build_prefix_search(Some("jo"), &["name"]).unwrap();
        assert_eq!(
            Value::Object(clause),
            json!({"OR": [{"name": {"startsWith": "jo", "mode": "insensitive"}}]})
        );
        assert_eq!(build_prefix_search(Some(""), &["name"]), None);
    }
}
