pub mod builder;
pub mod filters;
pub mod pagination;
pub mod params;
pub mod search;
pub mod sort;

pub use builder::{
    AdvancedQueryOptions, AggregateOptions, Conditions, CursorMeta, CursorQueryOptions,
    CursorResponse, GroupByOptions, PageMeta, PaginatedResponse, QueryBuilder, QueryOptions,
};
pub use filters::{
    build_date_range_filter, build_filters, build_not_filters, build_number_range_filter,
    build_relation_filters, combine_filters, combine_filters_with_or, DateRange, FilterMap,
    FilterValue, NumberRange, RelationFilterMap,
};
pub use pagination::{
    compute_cursor_pagination, compute_offset_pagination, reconcile_cursor_results, CursorPage,
    CursorPagination, OffsetPagination,
};
pub use search::{
    build_exact_search, build_nested_search_query, build_prefix_search, build_search_query,
    SearchField,
};
pub use sort::{OrderBy, SortOrder, SortSpec};
