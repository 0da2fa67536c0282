//! Add-ons layered over [`QueryBuilder`](crate::query::QueryBuilder): caching,
//! monitoring, scoping filters, batching, export, presets and webhooks.

pub mod batch;
pub mod context;
pub mod export;
pub mod monitored;
pub mod presets;
pub mod soft_delete;
pub mod tenant;
pub mod webhook;

pub use batch::{batch_query, batch_query_settled, BatchFailure, NamedQuery};
pub use context::QueryContext;
pub use export::{to_csv, to_json};
pub use monitored::QueryMonitor;
pub use presets::{PresetStore, QueryPreset};
pub use soft_delete::{build_soft_delete_filter, SoftDeleteOptions, DEFAULT_DELETED_AT_FIELD};
pub use tenant::{build_tenant_filter, DEFAULT_TENANT_FIELD};
pub use webhook::{
    WebhookDelivery, WebhookNotifier, WebhookOptions, WebhookPayload, WebhookQuery,
    QUERY_COMPLETED_EVENT,
};
