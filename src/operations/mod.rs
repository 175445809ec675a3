mod find_by_query;
pub use find_by_query::*;
mod remove_by_query;
pub use remove_by_query::*;
mod fluent;
pub use fluent::*;
