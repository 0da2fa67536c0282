mod common;

use common::{init_tracing, source, users, RecordingSource};
use query_shaper::query::{
    AdvancedQueryOptions, AggregateOptions, Conditions, CursorQueryOptions, FilterValue,
    GroupByOptions, NumberRange, QueryBuilder, QueryOptions, SearchField, SortOrder, SortSpec,
};
use query_shaper::source::{instrument, AggregateSpec, Database};
use serde_json::{json, Value};
use std::sync::Arc;

fn search_options() -> QueryOptions {
    let mut options = QueryOptions {
        page: Some(2),
        limit: Some(5),
        sort_by: Some("createdAt".to_string()),
        ..Default::default()
    };
    options.conditions.search = Some("john".to_string());
    options.conditions.search_fields = vec![SearchField::from("email")];
    options
        .conditions
        .filters
        .insert("status".to_string(), FilterValue::from("ACTIVE"));
    options
}

#[tokio::test]
async fn test_query_runs_find_many_and_count_with_same_condition() {
    init_tracing();
    let (recorder, database) = source("user", users(5));
    let builder = QueryBuilder::new(database);

    let response = builder.execute(&search_options()).await.unwrap();

    let calls = recorder.calls().await;
    assert_eq!(calls.find_many.len(), 1);
    assert_eq!(calls.count.len(), 1);

    let expected = json!({
        "OR": [{"email": {"contains": "john", "mode": "insensitive"}}],
        "status": "ACTIVE"
    });
    assert_eq!(Value::Object(calls.find_many[0].where_clause.clone()), expected);
    assert_eq!(calls.find_many[0].where_clause, calls.count[0].where_clause);

    let args = serde_json::to_value(&calls.find_many[0]).unwrap();
    assert_eq!(args["take"], 5);
    assert_eq!(args["skip"], 5);
    assert_eq!(args["orderBy"], json!({"createdAt": "desc"}));

    assert_eq!(response.data.len(), 5);
    assert_eq!(response.meta.total, 5);
    assert_eq!(response.meta.page, 2);
    assert_eq!(response.meta.limit, 5);
    assert_eq!(response.meta.total_pages, 1);
}

#[tokio::test]
async fn test_query_clamps_limit_and_page() {
    let (recorder, database) = source("user", users(3));
    let builder = QueryBuilder::new(database);

    let options = QueryOptions {
        page: Some(0),
        limit: Some(500),
        ..Default::default()
    };
    let response = builder.execute(&options).await.unwrap();

    let calls = recorder.calls().await;
    assert_eq!(calls.find_many[0].take, Some(100));
    assert_eq!(calls.find_many[0].skip, Some(0));
    assert_eq!(response.meta.page, 1);
    assert_eq!(response.meta.limit, 100);
}

#[tokio::test]
async fn test_total_pages_rounds_up() {
    let recorder = Arc::new(RecordingSource::new("user", users(10)).with_total(25));
    let database: Database = recorder.clone();
    let builder = QueryBuilder::new(database);

    let response = builder.execute(&QueryOptions::default()).await.unwrap();

    assert_eq!(response.meta.limit, 10);
    assert_eq!(response.meta.total_pages, 3);
}

#[tokio::test]
async fn test_envelope_serializes_in_camel_case() {
    let (_, database) = source("user", users(1));
    let builder = QueryBuilder::new(database);

    let response = builder.execute(&QueryOptions::default()).await.unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["meta"]["totalPages"], 1);
    assert!(json.get("_metrics").is_none());
}

#[tokio::test]
async fn test_cursor_query_over_fetches_and_reports_next_cursor() {
    let (recorder, database) = source("user", users(3));
    let builder = QueryBuilder::new(database);

    let options = CursorQueryOptions {
        limit: Some(2),
        ..Default::default()
    };
    let response = builder.execute_cursor(&options).await.unwrap();

    let calls = recorder.calls().await;
    assert_eq!(calls.find_many[0].take, Some(3));
    assert_eq!(calls.find_many[0].cursor, None);
    assert!(calls.count.is_empty());

    assert_eq!(response.data.len(), 2);
    assert!(response.meta.has_more);
    assert_eq!(response.meta.next_cursor.as_deref(), Some("2"));
    assert_eq!(response.meta.limit, 2);
}

#[tokio::test]
async fn test_cursor_query_last_page() {
    let (recorder, database) = source("user", users(2));
    let builder = QueryBuilder::new(database);

    let options = CursorQueryOptions {
        cursor: Some("abc".to_string()),
        limit: Some(5),
        sort_by: Some("createdAt".to_string()),
        sort_order: SortOrder::Asc,
        ..Default::default()
    };
    let response = builder.execute_cursor(&options).await.unwrap();

    let args = serde_json::to_value(&recorder.calls().await.find_many[0]).unwrap();
    assert_eq!(args["cursor"], json!({"id": "abc"}));
    assert_eq!(args["skip"], 1);
    assert_eq!(args["orderBy"], json!([{"createdAt": "asc"}, {"id": "asc"}]));

    assert_eq!(response.data.len(), 2);
    assert!(!response.meta.has_more);
    assert_eq!(response.meta.next_cursor, None);
}

#[tokio::test]
async fn test_advanced_query_passes_sort_list_in_order() {
    let (recorder, database) = source("post", users(1));
    let builder = QueryBuilder::new(database);

    let options = AdvancedQueryOptions {
        sort: vec![SortSpec::desc("priority"), SortSpec::asc("title")],
        ..Default::default()
    };
    builder.execute_advanced(&options).await.unwrap();

    let calls = recorder.calls().await;
    let args = serde_json::to_value(&calls.find_many[0]).unwrap();
    assert_eq!(args["orderBy"], json!([{"priority": "desc"}, {"title": "asc"}]));
    assert_eq!(calls.count.len(), 1);
}

#[tokio::test]
async fn test_count_aggregate_and_group_by() {
    let (recorder, database) = source("order", users(4));
    let builder = QueryBuilder::new(database);

    let mut conditions = Conditions::default();
    conditions.filters.insert(
        "amount".to_string(),
        FilterValue::NumberRange(NumberRange::new(Some(10), None::<i64>)),
    );

    assert_eq!(builder.count(&conditions).await.unwrap(), 4);

    let aggregate = builder
        .aggregate(&AggregateOptions {
            conditions: conditions.clone(),
            aggregate: AggregateSpec::default().count_all().sum(&["amount"]),
        })
        .await
        .unwrap();
    assert_eq!(aggregate["_count"]["_all"], 4);

    let groups = builder
        .group_by(&GroupByOptions {
            by: vec!["status".to_string()],
            conditions,
            aggregate: AggregateSpec::default().count_all(),
            order_by: Vec::new(),
        })
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);

    let calls = recorder.calls().await;
    assert_eq!(
        Value::Object(calls.count[0].where_clause.clone()),
        json!({"amount": {"gte": 10}})
    );
    let aggregate_args = serde_json::to_value(&calls.aggregate[0]).unwrap();
    assert_eq!(aggregate_args["_sum"], json!({"amount": true}));
    assert_eq!(calls.group_by[0].by, vec!["status".to_string()]);
}

#[tokio::test]
async fn test_data_source_errors_propagate_unchanged() {
    let database: Database = Arc::new(RecordingSource::failing("user", "connection reset"));
    let builder = QueryBuilder::new(database);

    let err = builder.execute(&QueryOptions::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "connection reset");

    let err = builder
        .execute_cursor(&CursorQueryOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "connection reset");
}

#[tokio::test]
async fn test_instrumented_source_is_transparent() {
    let (recorder, database) = source("user", users(2));
    let builder = QueryBuilder::new(instrument(database));

    let response = builder.execute(&QueryOptions::default()).await.unwrap();

    assert_eq!(builder.model_name(), "user");
    assert_eq!(response.data.len(), 2);
    assert_eq!(recorder.calls().await.find_many.len(), 1);
}

#[tokio::test]
async fn test_huge_page_saturates_skip() {
    let (recorder, database) = source("user", users(1));
    let builder = QueryBuilder::new(database);

    let options = QueryOptions {
        page: Some(i64::MAX),
        limit: Some(100),
        ..Default::default()
    };
    builder.execute(&options).await.unwrap();
    builder.fetch_for_export(&options, 1000).await.unwrap();

    let calls = recorder.calls().await;
    assert_eq!(calls.find_many[0].skip, Some(i64::MAX));
    assert_eq!(calls.find_many[1].skip, Some(i64::MAX));
}
