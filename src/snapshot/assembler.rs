//! Foreign-key joins

use crate::error::Result;
use crate::types::{JsonValue, Record};
use std::future::Future;
use tracing::debug;

/// How children relate to a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join<'a> {
    /// Parent field whose value selects the children
    pub foreign_key: &'a str,
    /// Key the child list is attached under
    pub child_key: &'a str,
}

/// Attach each parent's children, fetched one parent at a time
///
/// Parents keep their order and children keep fetch order. A parent
/// without a foreign-key value gets an empty list. Any failed fetch fails
/// the whole assembly.
pub async fn assemble<F, Fut>(parents: Vec<Record>, join: Join<'_>, fetch_children: F) -> Result<Vec<Record>>
where
    F: Fn(JsonValue) -> Fut,
    Fut: Future<Output = Result<Vec<Record>>>,
{
    let mut assembled = Vec::with_capacity(parents.len());

    for parent in parents {
        let children = match parent.get(join.foreign_key) {
            Some(key) if !key.is_null() => fetch_children(key.clone()).await?,
            _ => Vec::new(),
        };
        debug!(
            foreign_key = join.foreign_key,
            children = children.len(),
            "joined children"
        );

        let mut record = parent;
        record.insert(
            join.child_key.to_string(),
            JsonValue::Array(children.into_iter().map(JsonValue::Object).collect()),
        );
        assembled.push(record);
    }

    Ok(assembled)
}
