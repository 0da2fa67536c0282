use serde_json::json;

use crate::query::builder::QueryOptions;
use crate::query::pagination::{clamp_limit, clamp_page};
use crate::utils::hash::hash_key;

/// Deterministic cache key for an offset query against `model`.
///
/// Page and limit are normalized the same way the query normalizes them, the
/// search term is trimmed, and filters are keyed in sorted order, so options
/// that produce the same query produce the same key.
pub fn generate_cache_key(model: &str, options: &QueryOptions) -> String {
    let conditions = &options.conditions;
    let search = conditions
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let canonical = json!({
        "model": model,
        "page": clamp_page(options.page),
        "limit": clamp_limit(options.limit),
        "search": search,
        "searchFields": conditions.search_fields,
        "filters": conditions.filters,
        "relationFilters": conditions.relation_filters,
        "sortBy": options.sort_by,
        "sortOrder": options.sort_order,
        "include": options.include,
        "select": options.select,
    });

    format!("query:{}:{}", model, hash_key(&canonical.to_string()))
}
