//! Query-argument shaping for ORM-style data sources.
//!
//! Builders in [`query`] turn pagination, search, filter and sort inputs into
//! the argument objects a [`source::DataSource`] understands, and
//! [`query::QueryBuilder`] runs them. [`advanced`] layers caching, metrics,
//! scoping, batching, export, presets and webhooks on top.

pub mod advanced;
pub mod cache;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod query;
pub mod source;
pub mod utils;

pub use advanced::QueryContext;
pub use config::Config;
pub use errors::{ErrorCode, QueryError};
pub use query::{QueryBuilder, QueryOptions};
pub use source::{DataSource, Database};
