use serde_json::Value;

use crate::query::filters::{FilterMap, FilterValue};

/// Field holding the tenant id, unless overridden
pub const DEFAULT_TENANT_FIELD: &str = "tenantId";

/// Single equality filter scoping rows to one tenant
pub fn build_tenant_filter(tenant_id: impl Into<Value>, field: &str) -> FilterMap {
    let mut filters = FilterMap::new();
    filters.insert(field.to_string(), FilterValue::Scalar(tenant_id.into()));
    filters
}
