use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::filters::{build_filters, build_relation_filters, combine_filters, FilterMap, RelationFilterMap};
use super::pagination::{
    clamp_limit, clamp_page, compute_cursor_pagination, compute_offset_pagination,
    reconcile_cursor_results, DEFAULT_CURSOR_FIELD,
};
use super::search::{build_nested_search_query, SearchField};
use super::sort::{OrderBy, SortOrder, SortSpec};
use crate::metrics::QueryMetrics;
use crate::source::{
    AggregateArgs, AggregateSpec, CountArgs, Database, FindManyArgs, GroupByArgs, Where,
};

/// Search and filter inputs shared by every orchestrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_fields: Vec<SearchField>,
    #[serde(default, skip_serializing_if = "FilterMap::is_empty")]
    pub filters: FilterMap,
    #[serde(default, skip_serializing_if = "RelationFilterMap::is_empty")]
    pub relation_filters: RelationFilterMap,
}

impl Conditions {
    /// Merge search, filter and relation-filter fragments into one condition
    /// object. Later fragments win on key collisions.
    pub fn build_where(&self) -> Where {
        let search = build_nested_search_query(self.search.as_deref(), &self.search_fields);
        let filters = build_filters(&self.filters);
        let relations = build_relation_filters(&self.relation_filters);

        combine_filters(search.into_iter().chain([filters, relations]))
    }
}

/// Options for an offset-paginated list query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(flatten)]
    pub conditions: Conditions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Value>,
}

/// Options for a keyset-paginated list query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorQueryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(flatten)]
    pub conditions: Conditions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Value>,
}

impl CursorQueryOptions {
    pub fn cursor_field(&self) -> &str {
        self.cursor_field.as_deref().unwrap_or(DEFAULT_CURSOR_FIELD)
    }
}

/// Options for an offset-paginated query with a compound sort
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedQueryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(flatten)]
    pub conditions: Conditions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Value>,
}

/// Options for an aggregate query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOptions {
    #[serde(flatten)]
    pub conditions: Conditions,
    #[serde(flatten)]
    pub aggregate: AggregateSpec,
}

/// Options for a grouped aggregate query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupByOptions {
    pub by: Vec<String>,
    #[serde(flatten)]
    pub conditions: Conditions,
    #[serde(flatten)]
    pub aggregate: AggregateSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<SortSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(total: u64, page: i64, limit: i64) -> Self {
        let per_page = u64::try_from(limit).unwrap_or(1).max(1);
        Self {
            total,
            page,
            limit,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// `{data, meta}` envelope of an offset-paginated query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse {
    pub data: Vec<Value>,
    pub meta: PageMeta,
    #[serde(rename = "_metrics", default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<QueryMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorMeta {
    pub next_cursor: Option<String>,
    pub has_more: bool,
    pub limit: i64,
}

/// `{data, meta}` envelope of a keyset-paginated query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorResponse {
    pub data: Vec<Value>,
    pub meta: CursorMeta,
}

fn single_sort(sort_by: Option<&str>, order: SortOrder) -> Option<OrderBy> {
    sort_by
        .filter(|field| !field.is_empty())
        .map(|field| OrderBy::Field(SortSpec::new(field, order)))
}

/// Cursor pagination over a non-unique sort key needs the cursor field as a
/// tie-breaker, or rows can be skipped or repeated between pages.
fn cursor_sort(sort_by: Option<&str>, cursor_field: &str, order: SortOrder) -> OrderBy {
    match sort_by.filter(|field| !field.is_empty()) {
        Some(field) if field != cursor_field => OrderBy::Fields(vec![
            SortSpec::new(field, order),
            SortSpec::new(cursor_field, order),
        ]),
        _ => OrderBy::Field(SortSpec::new(cursor_field, order)),
    }
}

/// Composes the builders into data-source arguments and runs them.
///
/// Errors from the data source propagate unchanged: nothing is retried and a
/// failed count fails the whole query.
#[derive(Clone)]
pub struct QueryBuilder {
    source: Database,
}

impl QueryBuilder {
    pub fn new(source: Database) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Database {
        &self.source
    }

    pub fn model_name(&self) -> &str {
        self.source.model_name()
    }

    /// Offset-paginated list query. The list and count calls run concurrently
    /// against the same condition.
    pub async fn execute(&self, options: &QueryOptions) -> Result<PaginatedResponse> {
        let page = clamp_page(options.page);
        let pagination = compute_offset_pagination(options.page, options.limit);
        let where_clause = options.conditions.build_where();

        let args = FindManyArgs {
            where_clause: where_clause.clone(),
            order_by: single_sort(options.sort_by.as_deref(), options.sort_order),
            take: Some(pagination.take),
            skip: Some(pagination.skip),
            cursor: None,
            include: options.include.clone(),
            select: options.select.clone(),
        };

        debug!(
            model = self.model_name(),
            "Executing query: {}",
            serde_json::to_string(&args).unwrap_or_default()
        );

        let (data, total) = tokio::try_join!(
            self.source.find_many(args),
            self.source.count(CountArgs { where_clause }),
        )?;

        debug!(
            "Query returned {} rows (page {}, {} total matches)",
            data.len(),
            page,
            total
        );

        Ok(PaginatedResponse {
            data,
            meta: PageMeta::new(total, page, pagination.take),
            metrics: None,
        })
    }

    /// Keyset-paginated list query; over-fetches one row to detect a next page
    pub async fn execute_cursor(&self, options: &CursorQueryOptions) -> Result<CursorResponse> {
        let cursor_field = options.cursor_field();
        let limit = clamp_limit(options.limit);
        let pagination = compute_cursor_pagination(options.cursor.as_deref(), cursor_field, options.limit);

        let args = FindManyArgs {
            where_clause: options.conditions.build_where(),
            order_by: Some(cursor_sort(options.sort_by.as_deref(), cursor_field, options.sort_order)),
            take: Some(pagination.take),
            skip: pagination.skip,
            cursor: pagination.cursor,
            include: options.include.clone(),
            select: options.select.clone(),
        };

        debug!(
            model = self.model_name(),
            "Executing cursor query: {}",
            serde_json::to_string(&args).unwrap_or_default()
        );

        let rows = self.source.find_many(args).await?;
        let page = reconcile_cursor_results(rows, limit, cursor_field);

        debug!(
            "Cursor query returned {} rows (has_more={})",
            page.data.len(),
            page.has_more
        );

        Ok(CursorResponse {
            data: page.data,
            meta: CursorMeta {
                next_cursor: page.next_cursor,
                has_more: page.has_more,
                limit,
            },
        })
    }

    /// Offset-paginated list query with an ordered list of sort fields
    pub async fn execute_advanced(&self, options: &AdvancedQueryOptions) -> Result<PaginatedResponse> {
        let page = clamp_page(options.page);
        let pagination = compute_offset_pagination(options.page, options.limit);
        let where_clause = options.conditions.build_where();

        let order_by = if options.sort.is_empty() {
            None
        } else {
            Some(OrderBy::Fields(options.sort.clone()))
        };

        let args = FindManyArgs {
            where_clause: where_clause.clone(),
            order_by,
            take: Some(pagination.take),
            skip: Some(pagination.skip),
            cursor: None,
            include: options.include.clone(),
            select: options.select.clone(),
        };

        debug!(
            model = self.model_name(),
            "Executing advanced query: {}",
            serde_json::to_string(&args).unwrap_or_default()
        );

        let (data, total) = tokio::try_join!(
            self.source.find_many(args),
            self.source.count(CountArgs { where_clause }),
        )?;

        Ok(PaginatedResponse {
            data,
            meta: PageMeta::new(total, page, pagination.take),
            metrics: None,
        })
    }

    /// Count rows matching the search and filters
    pub async fn count(&self, conditions: &Conditions) -> Result<u64> {
        let where_clause = conditions.build_where();
        debug!(model = self.model_name(), "Counting matches for {:?}", where_clause);

        let total = self.source.count(CountArgs { where_clause }).await?;

        debug!("Query matched {} rows", total);
        Ok(total)
    }

    /// Aggregate over rows matching the search and filters
    pub async fn aggregate(&self, options: &AggregateOptions) -> Result<Value> {
        let args = AggregateArgs {
            where_clause: options.conditions.build_where(),
            spec: options.aggregate.clone(),
        };

        debug!(
            model = self.model_name(),
            "Executing aggregate: {}",
            serde_json::to_string(&args).unwrap_or_default()
        );

        self.source.aggregate(args).await
    }

    /// Grouped aggregate over rows matching the search and filters
    pub async fn group_by(&self, options: &GroupByOptions) -> Result<Vec<Value>> {
        let order_by = if options.order_by.is_empty() {
            None
        } else {
            Some(OrderBy::Fields(options.order_by.clone()))
        };

        let args = GroupByArgs {
            by: options.by.clone(),
            where_clause: options.conditions.build_where(),
            spec: options.aggregate.clone(),
            order_by,
        };

        debug!(
            model = self.model_name(),
            "Executing groupBy: {}",
            serde_json::to_string(&args).unwrap_or_default()
        );

        self.source.group_by(args).await
    }

    /// Fetch up to `max_rows` rows for export; no count query is issued
    pub async fn fetch_for_export(&self, options: &QueryOptions, max_rows: i64) -> Result<Vec<Value>> {
        let max_rows = max_rows.max(1);
        let take = options.limit.unwrap_or(max_rows).clamp(1, max_rows);
        let skip = (clamp_page(options.page) - 1).saturating_mul(take);

        let args = FindManyArgs {
            where_clause: options.conditions.build_where(),
            order_by: single_sort(options.sort_by.as_deref(), options.sort_order),
            take: Some(take),
            skip: Some(skip),
            cursor: None,
            include: options.include.clone(),
            select: options.select.clone(),
        };

        debug!(
            model = self.model_name(),
            "Fetching up to {} rows for export",
            take
        );

        self.source.find_many(args).await
    }
}
