//! Query normalization
//!
//! Turns an inbound query string into a [`QuerySpec`]: equality
//! constraints (`search_by`), a projection list (`filter`), inclusive
//! date ranges (`<field>_since` / `<field>_to`), a bounded `limit` and the
//! opaque `offset` cursor.
//!
//! The normalizer never touches a backend. Repeated keys arrive as lists
//! and single keys as strings; both shapes are handled the same way.

mod parser;
mod types;

pub use parser::{normalize, parse_datetime, parse_filter, parse_limit, parse_search_by};
pub use types::{DateRange, LimitPolicy, ParamValue, QuerySpec, RawQuery};
