//! Raw request parameters and their validation.
//!
//! These types sit in front of the builders: callers deserialize query-string
//! pairs into them, call `validate()`, then hand the typed values on. Unlike
//! the builders, which clamp silently, validation here rejects bad input.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};

use super::filters::{parse_date, DateRange, NumberRange};
use super::pagination::{DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT};
use super::sort::SortOrder;
use crate::errors::QueryError;

/// Sort field used when the caller gives none
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Longest accepted free-text search term
pub const MAX_SEARCH_LENGTH: usize = 200;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(Number),
    String(String),
}

fn parse_number(raw: &str) -> Option<Number> {
    let raw = raw.trim();
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Number::from(int));
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64)
}

fn coerce_number<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => parse_number(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {:?}", s))),
    }
}

fn coerce_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match coerce_number(deserializer)? {
        None => Ok(None),
        Some(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {}", n))),
    }
}

/// Deserialize parameters from query-string pairs
pub fn from_query_pairs<T, I, K, V>(pairs: I) -> Result<T, QueryError>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let object: Map<String, Value> = pairs
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), Value::String(v.as_ref().to_string())))
        .collect();

    serde_json::from_value(Value::Object(object)).map_err(|e| QueryError::Validation(e.to_string()))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(default, deserialize_with = "coerce_integer")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "coerce_integer")]
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.page() < 1 {
            return Err(QueryError::Validation(format!(
                "page must be at least 1, got {}",
                self.page()
            )));
        }
        validate_limit(self.limit())
    }
}

fn validate_limit(limit: i64) -> Result<(), QueryError> {
    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(QueryError::Validation(format!(
            "limit must be between {} and {}, got {}",
            MIN_LIMIT, MAX_LIMIT, limit
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorParams {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default, deserialize_with = "coerce_integer")]
    pub limit: Option<i64>,
}

impl CursorParams {
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        validate_limit(self.limit())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortParams {
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

impl SortParams {
    pub fn sort_by(&self) -> &str {
        self.sort_by
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SORT_FIELD)
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: Option<String>,
}

impl SearchParams {
    /// Trimmed term, `None` when blank
    pub fn term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        match self.term() {
            Some(term) if term.chars().count() > MAX_SEARCH_LENGTH => Err(QueryError::Validation(
                format!("search must be at most {} characters", MAX_SEARCH_LENGTH),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DateRangeParams {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl DateRangeParams {
    /// Parse and order-check the bounds
    pub fn to_range(&self) -> Result<DateRange, QueryError> {
        let parse = |raw: &Option<String>| -> Result<_, QueryError> {
            match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                None => Ok(None),
                Some(s) => parse_date(s)
                    .map(Some)
                    .ok_or_else(|| QueryError::Validation(format!("invalid date: {:?}", s))),
            }
        };

        let range = DateRange::new(parse(&self.from)?, parse(&self.to)?);
        if let (Some(from), Some(to)) = (range.from, range.to) {
            if from > to {
                return Err(QueryError::Validation(
                    "date range 'from' must not be after 'to'".to_string(),
                ));
            }
        }
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        self.to_range().map(|_| ())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NumberRangeParams {
    #[serde(default, deserialize_with = "coerce_number")]
    pub from: Option<Number>,
    #[serde(default, deserialize_with = "coerce_number")]
    pub to: Option<Number>,
}

impl NumberRangeParams {
    pub fn validate(&self) -> Result<(), QueryError> {
        let from = self.from.as_ref().and_then(Number::as_f64);
        let to = self.to.as_ref().and_then(Number::as_f64);
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(QueryError::Validation(
                    "number range 'from' must not exceed 'to'".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn to_range(&self) -> Result<NumberRange, QueryError> {
        self.validate()?;
        Ok(NumberRange {
            from: self.from.clone(),
            to: self.to.clone(),
        })
    }
}

/// Page, sort and search parameters of a typical list endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListParams {
    #[serde(flatten)]
    pub page: PageParams,
    #[serde(flatten)]
    pub sort: SortParams,
    #[serde(flatten)]
    pub search: SearchParams,
}

impl ListParams {
    pub fn validate(&self) -> Result<(), QueryError> {
        self.page.validate()?;
        self.search.validate()
    }
}
