pub mod builder;
pub mod logical_cached_results;
pub mod logical_filter;
pub mod logical_join;
pub mod logical_passthrough;
pub mod logical_project;
pub mod logical_scan;
pub mod logical_show_columns;
pub mod logical_strip_row;
pub mod logical_subquery_alias;
pub mod logical_table_alias;
pub mod logical_trigger;
pub mod logical_unresolved;
pub mod operator;
pub mod schema;
