//! limit+1 probe pagination

use super::links::with_cursor;
use super::types::{NextPage, PageResult};
use crate::cursor::CursorCodec;
use crate::error::Result;
use crate::types::Record;
use tracing::debug;

/// Paginates a result set fetched with one record more than `limit`
#[derive(Debug, Clone)]
pub struct ProbePaginator {
    /// Records per page, always positive
    pub limit: usize,
    pub codec: CursorCodec,
}

impl ProbePaginator {
    pub fn new(limit: usize, codec: CursorCodec) -> Self {
        Self { limit, codec }
    }

    /// How many records the backend should be asked for
    pub fn fetch_size(&self) -> usize {
        self.limit + 1
    }

    /// Truncate to `limit` and work out the next page
    pub fn paginate(&self, mut fetched: Vec<Record>, self_uri: &str) -> Result<PageResult> {
        let next = if fetched.len() > self.limit {
            fetched.truncate(self.limit);
            match fetched.last() {
                Some(last) => {
                    let cursor = self.codec.encode(last)?;
                    NextPage::Continue {
                        href: with_cursor(self_uri, &cursor),
                        cursor,
                    }
                }
                None => NextPage::Done,
            }
        } else {
            NextPage::Done
        };

        debug!(
            items = fetched.len(),
            more = next.is_continue(),
            "paginated result set"
        );

        Ok(PageResult {
            items: fetched,
            self_link: self_uri.to_string(),
            next,
        })
    }
}
