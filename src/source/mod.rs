pub mod args;
pub mod backend;
pub mod instrumented;

use std::sync::Arc;

pub use args::{AggregateArgs, AggregateSpec, CountArgs, FindManyArgs, GroupByArgs, Where};
pub use backend::DataSource;
pub use instrumented::InstrumentedSource;

/// Data source handle - polymorphic over ORM clients
pub type Database = Arc<dyn DataSource>;

/// Wrap a data source so every call is recorded in the metrics registry
pub fn instrument(source: Database) -> Database {
    Arc::new(InstrumentedSource::new(source)) as Database
}
