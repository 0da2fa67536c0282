//! Filter maps and the condition objects built from them.
//!
//! A [`FilterMap`] maps field names to [`FilterValue`]s. Building a map yields
//! a conjunction (one key per field) in the data source's `where` shape.
//! Absent values vanish from the output instead of producing an explicit
//! "no constraint" marker.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::source::Where;

/// Field name to filter value
pub type FilterMap = BTreeMap<String, FilterValue>;

/// Relation name to the filter applied inside that relation
pub type RelationFilterMap = BTreeMap<String, FilterMap>;

/// Inclusive numeric bounds; either side may be open
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberRange {
    pub from: Option<Number>,
    pub to: Option<Number>,
}

impl NumberRange {
    pub fn new(from: Option<impl Into<Number>>, to: Option<impl Into<Number>>) -> Self {
        Self {
            from: from.map(Into::into),
            to: to.map(Into::into),
        }
    }
}

/// Inclusive date bounds; either side may be open
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }
}

/// Typed filter input.
///
/// `From<serde_json::Value>` classifies loosely typed input in a fixed order:
/// numeric range, date range, array, boolean, then scalar. An object matching
/// none of the range shapes is kept whole as a [`FilterValue::Literal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FilterValue {
    /// No constraint; the key is dropped
    Absent,
    /// Equality against a string, number or enum-like value
    Scalar(Value),
    Bool(bool),
    /// Membership; an empty list drops the key
    List(Vec<Value>),
    NumberRange(NumberRange),
    DateRange(DateRange),
    /// Field must be null
    IsNull,
    /// Field must not be null
    NotNull,
    /// Unrecognised shape, passed through as an equality literal
    Literal(Value),
}

/// Parse a date bound from RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC)
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn format_date(date: &DateTime<Utc>) -> Value {
    Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn date_bound(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value.and_then(Value::as_str).and_then(parse_date)
}

fn number_bound(value: Option<&Value>) -> Option<Number> {
    match value {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
}

fn classify_object(object: Map<String, Value>) -> FilterValue {
    if object.len() == 1 {
        match (object.get("equals"), object.get("not")) {
            (Some(Value::Null), _) => return FilterValue::IsNull,
            (_, Some(Value::Null)) => return FilterValue::NotNull,
            _ => {}
        }
    }

    let from = object.get("from");
    let to = object.get("to");
    if from.is_none() && to.is_none() {
        return FilterValue::Literal(Value::Object(object));
    }

    if from.is_some_and(Value::is_number) || to.is_some_and(Value::is_number) {
        return FilterValue::NumberRange(NumberRange {
            from: number_bound(from),
            to: number_bound(to),
        });
    }

    if from.is_some_and(Value::is_string) || to.is_some_and(Value::is_string) {
        return FilterValue::DateRange(DateRange {
            from: date_bound(from),
            to: date_bound(to),
        });
    }

    FilterValue::Literal(Value::Object(object))
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FilterValue::Absent,
            Value::String(s) if s.is_empty() => FilterValue::Absent,
            Value::Object(object) => classify_object(object),
            Value::Array(items) => FilterValue::List(items),
            Value::Bool(b) => FilterValue::Bool(b),
            scalar => FilterValue::Scalar(scalar),
        }
    }
}

fn range_object(from: Option<Value>, to: Option<Value>) -> Value {
    let mut object = Map::new();
    if let Some(from) = from {
        object.insert("from".into(), from);
    }
    if let Some(to) = to {
        object.insert("to".into(), to);
    }
    Value::Object(object)
}

impl From<FilterValue> for Value {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::Absent => Value::Null,
            FilterValue::Scalar(v) | FilterValue::Literal(v) => v,
            FilterValue::Bool(b) => Value::Bool(b),
            FilterValue::List(items) => Value::Array(items),
            FilterValue::NumberRange(range) => range_object(
                range.from.map(Value::Number),
                range.to.map(Value::Number),
            ),
            FilterValue::DateRange(range) => {
                range_object(range.from.as_ref().map(format_date), range.to.as_ref().map(format_date))
            }
            FilterValue::IsNull => serde_json::json!({ "equals": null }),
            FilterValue::NotNull => serde_json::json!({ "not": null }),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::from(Value::String(value.to_string()))
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::from(Value::String(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Scalar(Value::from(value))
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<NumberRange> for FilterValue {
    fn from(range: NumberRange) -> Self {
        FilterValue::NumberRange(range)
    }
}

impl From<DateRange> for FilterValue {
    fn from(range: DateRange) -> Self {
        FilterValue::DateRange(range)
    }
}

/// Convert a JSON object into a filter map, classifying every value
pub fn filter_map_from_json(object: Map<String, Value>) -> FilterMap {
    object
        .into_iter()
        .map(|(field, value)| (field, FilterValue::from(value)))
        .collect()
}

/// Convert a JSON object into relation filters. Entries whose value is not an
/// object are skipped.
pub fn relation_filters_from_json(object: Map<String, Value>) -> RelationFilterMap {
    object
        .into_iter()
        .filter_map(|(relation, value)| match value {
            Value::Object(nested) => Some((relation, filter_map_from_json(nested))),
            _ => None,
        })
        .collect()
}

fn bounds(gte: Option<Value>, lte: Option<Value>) -> Value {
    let mut condition = Map::new();
    if let Some(gte) = gte {
        condition.insert("gte".into(), gte);
    }
    if let Some(lte) = lte {
        condition.insert("lte".into(), lte);
    }
    Value::Object(condition)
}

/// `from` → `gte`, `to` → `lte`; a missing bound is left out
pub fn build_date_range_filter(range: &DateRange) -> Value {
    bounds(
        range.from.as_ref().map(format_date),
        range.to.as_ref().map(format_date),
    )
}

/// `from` → `gte`, `to` → `lte`; a missing bound is left out
pub fn build_number_range_filter(range: &NumberRange) -> Value {
    bounds(
        range.from.clone().map(Value::Number),
        range.to.clone().map(Value::Number),
    )
}

fn build_condition(value: &FilterValue) -> Option<Value> {
    match value {
        FilterValue::Absent => None,
        FilterValue::Scalar(Value::Null) => None,
        FilterValue::Scalar(Value::String(s)) if s.is_empty() => None,
        FilterValue::NumberRange(range) => Some(build_number_range_filter(range)),
        FilterValue::DateRange(range) => Some(build_date_range_filter(range)),
        FilterValue::List(items) if items.is_empty() => None,
        FilterValue::List(items) => Some(serde_json::json!({ "in": items })),
        FilterValue::Bool(b) => Some(Value::Bool(*b)),
        FilterValue::IsNull => Some(Value::Null),
        FilterValue::NotNull => Some(serde_json::json!({ "not": null })),
        FilterValue::Scalar(v) | FilterValue::Literal(v) => Some(v.clone()),
    }
}

/// Build a conjunction with one condition per present field
pub fn build_filters(filters: &FilterMap) -> Where {
    filters
        .iter()
        .filter_map(|(field, value)| build_condition(value).map(|c| (field.clone(), c)))
        .collect()
}

/// Build each relation's filters and nest them under the relation name
pub fn build_relation_filters(relations: &RelationFilterMap) -> Where {
    relations
        .iter()
        .map(|(relation, filters)| (relation.clone(), Value::Object(build_filters(filters))))
        .collect()
}

/// Negated filter set; `None` when nothing would be negated
pub fn build_not_filters(filters: &FilterMap) -> Option<Where> {
    let built = build_filters(filters);
    if built.is_empty() {
        return None;
    }

    let mut clause = Where::new();
    clause.insert("NOT".to_string(), Value::Object(built));
    Some(clause)
}

/// Shallow left-to-right merge; later keys overwrite earlier ones
pub fn combine_filters<I>(fragments: I) -> Where
where
    I: IntoIterator<Item = Where>,
{
    let mut combined = Where::new();
    for fragment in fragments {
        combined.extend(fragment);
    }
    combined
}

/// Disjunction of the non-empty fragments. A single survivor is returned
/// as-is, not wrapped.
pub fn combine_filters_with_or<I>(fragments: I) -> Option<Where>
where
    I: IntoIterator<Item = Where>,
{
    let mut survivors: Vec<Where> = fragments.into_iter().filter(|f| !f.is_empty()).collect();

    match survivors.len() {
        0 => None,
        1 => survivors.pop(),
        _ => {
            let mut clause = Where::new();
            clause.insert(
                "OR".to_string(),
                Value::Array(survivors.into_iter().map(Value::Object).collect()),
            );
            Some(clause)
        }
    }
}
