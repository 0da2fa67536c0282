use serde::{Deserialize, Serialize};

use crate::query::filters::{FilterMap, FilterValue};

/// Timestamp field marking a row as soft-deleted, unless overridden
pub const DEFAULT_DELETED_AT_FIELD: &str = "deletedAt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftDeleteOptions {
    #[serde(default = "default_deleted_at_field")]
    pub deleted_at_field: String,
    /// Return live and deleted rows alike
    #[serde(default)]
    pub include_trashed: bool,
    /// Return deleted rows only
    #[serde(default)]
    pub trashed_only: bool,
}

fn default_deleted_at_field() -> String {
    DEFAULT_DELETED_AT_FIELD.to_string()
}

impl Default for SoftDeleteOptions {
    fn default() -> Self {
        Self {
            deleted_at_field: default_deleted_at_field(),
            include_trashed: false,
            trashed_only: false,
        }
    }
}

/// Filter hiding soft-deleted rows. `include_trashed` takes precedence over
/// `trashed_only` and yields an empty filter.
pub fn build_soft_delete_filter(options: &SoftDeleteOptions) -> FilterMap {
    let mut filters = FilterMap::new();
    if options.include_trashed {
        return filters;
    }

    let condition = if options.trashed_only {
        FilterValue::NotNull
    } else {
        FilterValue::IsNull
    };
    filters.insert(options.deleted_at_field.clone(), condition);
    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filters::build_filters;
    use serde_json::{json, Value};

    #[test]
    fn test_default_hides_deleted_rows() {
        let filters = build_soft_delete_filter(&SoftDeleteOptions::default());
        assert_eq!(Value::Object(build_filters(&filters)), json!({"deletedAt": null}));
    }

    #[test]
    fn test_include_trashed_is_empty() {
        let options = SoftDeleteOptions {
            include_trashed: true,
            trashed_only: true,
            ..Default::default()
        };
        assert!(build_soft_delete_filter(&options).is_empty());
    }

    #[test]
    fn test_trashed_only_inverts() {
        let options = SoftDeleteOptions {
            deleted_at_field: "removedAt".into(),
            trashed_only: true,
            ..Default::default()
        };
        let filters = build_soft_delete_filter(&options);
        assert_eq!(
            Value::Object(build_filters(&filters)),
            json!({"removedAt": {"not": null}})
        );
    }
}
