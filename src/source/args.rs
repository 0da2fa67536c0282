use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::query::sort::OrderBy;

/// Condition object handed to the data source as `where`
pub type Where = Map<String, Value>;

/// Arguments for a list query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyArgs {
    #[serde(rename = "where")]
    pub where_clause: Where,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Where>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Value>,
}

/// Arguments for a count query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CountArgs {
    #[serde(rename = "where")]
    pub where_clause: Where,
}

/// Per-field aggregation selection (`_count`, `_sum`, `_avg`, `_min`, `_max`).
///
/// `_count` accepts either `true` (count rows) or a field selection; the
/// others always take a `{ field: true }` selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSpec {
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<Value>,
    #[serde(rename = "_sum", skip_serializing_if = "Option::is_none")]
    pub sum: Option<Map<String, Value>>,
    #[serde(rename = "_avg", skip_serializing_if = "Option::is_none")]
    pub avg: Option<Map<String, Value>>,
    #[serde(rename = "_min", skip_serializing_if = "Option::is_none")]
    pub min: Option<Map<String, Value>>,
    #[serde(rename = "_max", skip_serializing_if = "Option::is_none")]
    pub max: Option<Map<String, Value>>,
}

fn field_selection(fields: &[&str]) -> Map<String, Value> {
    fields
        .iter()
        .map(|field| (field.to_string(), Value::Bool(true)))
        .collect()
}

impl AggregateSpec {
    pub fn count_all(mut self) -> Self {
        self.count = Some(Value::Bool(true));
        self
    }

    pub fn count_fields(mut self, fields: &[&str]) -> Self {
        self.count = Some(Value::Object(field_selection(fields)));
        self
    }

    pub fn sum(mut self, fields: &[&str]) -> Self {
        self.sum = Some(field_selection(fields));
        self
    }

    pub fn avg(mut self, fields: &[&str]) -> Self {
        self.avg = Some(field_selection(fields));
        self
    }

    pub fn min(mut self, fields: &[&str]) -> Self {
        self.min = Some(field_selection(fields));
        self
    }

    pub fn max(mut self, fields: &[&str]) -> Self {
        self.max = Some(field_selection(fields));
        self
    }
}

/// Arguments for an aggregate query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateArgs {
    #[serde(rename = "where")]
    pub where_clause: Where,
    #[serde(flatten)]
    pub spec: AggregateSpec,
}

/// Arguments for a grouped aggregate query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupByArgs {
    pub by: Vec<String>,
    #[serde(rename = "where")]
    pub where_clause: Where,
    #[serde(flatten)]
    pub spec: AggregateSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::sort::SortSpec;
    use serde_json::json;

    #[test]
    fn test_find_many_args_shape() {
        let mut where_clause = Where::new();
        where_clause.insert("status".into(), json!("ACTIVE"));

        let args = FindManyArgs {
            where_clause,
            order_by: Some(OrderBy::Field(SortSpec::desc("createdAt"))),
            take: Some(10),
            skip: Some(20),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({
                "where": {"status": "ACTIVE"},
                "orderBy": {"createdAt": "desc"},
                "take": 10,
                "skip": 20
            })
        );
    }

    #[test]
    fn test_aggregate_args_flatten_spec() {
        let args = AggregateArgs {
            where_clause: Where::new(),
            spec: AggregateSpec::default().count_all().sum(&["amount"]).avg(&["amount"]),
        };

        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({
                "where": {},
                "_count": true,
                "_sum": {"amount": true},
                "_avg": {"amount": true}
            })
        );
    }

    #[test]
    fn test_group_by_args_shape() {
        let args = GroupByArgs {
            by: vec!["status".into()],
            where_clause: Where::new(),
            spec: AggregateSpec::default().count_fields(&["id"]),
            order_by: None,
        };

        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({"by": ["status"], "where": {}, "_count": {"id": true}})
        );
    }
}
