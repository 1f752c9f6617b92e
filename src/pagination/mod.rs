//! Pagination module
//!
//! Supports: limit+1 probe pagination over identity-ordered collections,
//! and link rewriting for backends that paginate on their own (Monasca).
//!
//! # Overview
//!
//! Native collections are fetched for one record more than the requested
//! limit. The presence of that extra record is the only signal that more
//! data exists; the cursor handed back is the identity of the last record
//! kept. Self and next links are derived from the request URI, swapping in
//! the new cursor while leaving every other query parameter untouched.

mod links;
mod probe;
mod types;

pub use links::{rewrite_backend_links, split_uri, with_cursor};
pub use probe::ProbePaginator;
pub use types::{NextPage, PageResult};

#[cfg(test)]
mod tests;
