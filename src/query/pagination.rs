use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::source::Where;

/// Smallest page size a query may request
pub const MIN_LIMIT: i64 = 1;

/// Largest page size a query may request
pub const MAX_LIMIT: i64 = 100;

/// Page size used when the caller gives none
pub const DEFAULT_LIMIT: i64 = 10;

/// Cursor field used when the caller gives none
pub const DEFAULT_CURSOR_FIELD: &str = "id";

/// Clamp a requested page size into `[MIN_LIMIT, MAX_LIMIT]`
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(MIN_LIMIT, MAX_LIMIT)
}

/// Clamp a requested page number to at least 1
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetPagination {
    pub take: i64,
    pub skip: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorPagination {
    pub take: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Where>,
}

/// Rows of one cursor page plus the bookkeeping to request the next one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage {
    pub data: Vec<Value>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// Translate page/limit into take/skip. Out-of-range input is clamped, never
/// rejected.
pub fn compute_offset_pagination(page: Option<i64>, limit: Option<i64>) -> OffsetPagination {
    let page = clamp_page(page);
    let take = clamp_limit(limit);

    OffsetPagination {
        take,
        skip: (page - 1).saturating_mul(take),
    }
}

/// Translate cursor/limit into keyset arguments.
///
/// `take` over-fetches one row so the caller can tell whether another page
/// exists. With a cursor, the cursor row itself is skipped.
pub fn compute_cursor_pagination(
    cursor: Option<&str>,
    cursor_field: &str,
    limit: Option<i64>,
) -> CursorPagination {
    let take = clamp_limit(limit) + 1;

    match cursor {
        Some(cursor) => {
            let mut anchor = Where::new();
            anchor.insert(cursor_field.to_string(), Value::String(cursor.to_string()));
            CursorPagination {
                take,
                skip: Some(1),
                cursor: Some(anchor),
            }
        }
        None => CursorPagination {
            take,
            skip: None,
            cursor: None,
        },
    }
}

/// Render a cursor field value as the opaque string handed back to callers
fn cursor_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Trim an over-fetched result set down to `limit` rows and derive the
/// next cursor from the last row kept.
pub fn reconcile_cursor_results(
    mut results: Vec<Value>,
    limit: i64,
    cursor_field: &str,
) -> CursorPage {
    let limit = usize::try_from(limit).unwrap_or(0);
    let has_more = results.len() > limit;

    if has_more {
        results.truncate(limit);
    }

    let next_cursor = if has_more {
        results
            .last()
            .and_then(|row| row.get(cursor_field))
            .and_then(cursor_string)
    } else {
        None
    };

    CursorPage {
        data: results,
        has_more,
        next_cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_offset_pagination() {
        let p = compute_offset_pagination(Some(3), Some(20));
        assert_eq!(p, OffsetPagination { take: 20, skip: 40 });

        for page in 1..=5 {
            for limit in [1, 10, 100] {
                let p = compute_offset_pagination(Some(page), Some(limit));
                assert_eq!(p.take, limit);
                assert_eq!(p.skip, (page - 1) * p.take);
            }
        }
    }

    #[test]
    fn test_offset_pagination_huge_page_saturates() {
        let p = compute_offset_pagination(Some(i64::MAX), Some(100));
        assert_eq!(p.take, 100);
        assert_eq!(p.skip, i64::MAX);
    }

    #[test]
    fn test_offset_pagination_clamps() {
        assert_eq!(
            compute_offset_pagination(Some(-4), Some(500)),
            OffsetPagination { take: 100, skip: 0 }
        );
        assert_eq!(
            compute_offset_pagination(Some(2), Some(0)),
            OffsetPagination { take: 1, skip: 1 }
        );
        assert_eq!(
            compute_offset_pagination(None, None),
            OffsetPagination { take: DEFAULT_LIMIT, skip: 0 }
        );
    }

    #[test]
    fn test_cursor_pagination_without_cursor() {
        let p = compute_cursor_pagination(None, "id", Some(20));
        assert_eq!(p.take, 21);
        assert_eq!(p.skip, None);
        assert_eq!(p.cursor, None);
    }

    #[test]
    fn test_cursor_pagination_with_cursor() {
        let p = compute_cursor_pagination(Some("abc"), "slug", Some(500));
        assert_eq!(p.take, 101);
        assert_eq!(p.skip, Some(1));
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            json!({"take": 101, "skip": 1, "cursor": {"slug": "abc"}})
        );
    }

    #[test]
    fn test_reconcile_trims_sentinel_row() {
        let rows = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})];
        let page = reconcile_cursor_results(rows, 2, "id");

        assert_eq!(page.data.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.next_cursor.as_deref(), Some("2"));
    }

    #[test]
    fn test_reconcile_last_page() {
        let rows = vec![json!({"id": "a"}), json!({"id": "b"})];
        let page = reconcile_cursor_results(rows, 2, "id");

        assert_eq!(page.data.len(), 2);
        assert!(!page.has_more);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_reconcile_custom_cursor_field() {
        let rows = vec![
            json!({"id": 1, "slug": "first"}),
            json!({"id": 2, "slug": "second"}),
        ];
        let page = reconcile_cursor_results(rows, 1, "slug");
        assert_eq!(page.next_cursor.as_deref(), Some("first"));
    }

    #[test]
    fn test_reconcile_zero_limit_has_no_cursor() {
        let rows = vec![json!({"id": 1})];
        let page = reconcile_cursor_results(rows, 0, "id");

        assert!(page.data.is_empty());
        assert!(page.has_more);
        assert_eq!(page.next_cursor, None);
    }
}
