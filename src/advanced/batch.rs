//! Concurrent execution of several named queries.
//!
//! [`batch_query`] is all-or-nothing: the first failure aborts the batch and
//! no results are returned. [`batch_query_settled`] waits for every query and
//! reports failures per entry instead.

use anyhow::Result;
use futures::future::{join_all, try_join_all};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::errors::ErrorCode;
use crate::query::builder::{PaginatedResponse, QueryBuilder, QueryOptions};

/// One query in a batch, possibly against its own model
#[derive(Clone)]
pub struct NamedQuery {
    pub name: String,
    pub builder: QueryBuilder,
    pub options: QueryOptions,
}

impl NamedQuery {
    pub fn new(name: impl Into<String>, builder: QueryBuilder, options: QueryOptions) -> Self {
        Self {
            name: name.into(),
            builder,
            options,
        }
    }
}

/// Failure marker for one entry of a settled batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub code: ErrorCode,
    pub message: String,
}

/// Run every query concurrently; any failure fails the whole batch
pub async fn batch_query(queries: Vec<NamedQuery>) -> Result<HashMap<String, PaginatedResponse>> {
    debug!("Running batch of {} queries", queries.len());

    let results = try_join_all(queries.into_iter().map(|query| async move {
        let response = query.builder.execute(&query.options).await?;
        Ok::<_, anyhow::Error>((query.name, response))
    }))
    .await?;

    Ok(results.into_iter().collect())
}

/// Run every query concurrently and keep each outcome, success or failure
pub async fn batch_query_settled(
    queries: Vec<NamedQuery>,
) -> HashMap<String, Result<PaginatedResponse, BatchFailure>> {
    debug!("Running settled batch of {} queries", queries.len());

    let results = join_all(queries.into_iter().map(|query| async move {
        let outcome = query
            .builder
            .execute(&query.options)
            .await
            .map_err(|e| {
                warn!(query = %query.name, "Batch entry failed: {:#}", e);
                BatchFailure {
                    code: ErrorCode::of(&e),
                    message: format!("{:#}", e),
                }
            });
        (query.name, outcome)
    }))
    .await;

    results.into_iter().collect()
}
