//! Natively paginated collections

use super::types::{FetchRequest, RecordSource};
use crate::entity::EntitySchema;
use crate::error::Result;
use crate::pagination::{PageResult, ProbePaginator};
use crate::projection::{project, Projection};
use crate::query::QuerySpec;
use crate::types::{Record, SortOrder};
use std::sync::Arc;

/// One entity of a source, read page by page
#[derive(Clone)]
pub struct Collection {
    source: Arc<dyn RecordSource>,
    schema: &'static EntitySchema,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("entity", &self.schema.name)
            .finish_non_exhaustive()
    }
}

impl Collection {
    pub fn new(source: Arc<dyn RecordSource>, schema: &'static EntitySchema) -> Self {
        Self { source, schema }
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn source(&self) -> &Arc<dyn RecordSource> {
        &self.source
    }

    /// Unbounded fetch for a normalized query, cursor applied
    pub fn request(&self, spec: &QuerySpec) -> Result<FetchRequest> {
        let mut request = FetchRequest::new(self.schema);
        for (field, value) in &spec.search_by {
            request = request.equals(field, value);
        }
        for range in &spec.date_ranges {
            request = request.within(range);
        }
        let before = spec
            .cursor
            .as_deref()
            .map(|c| self.schema.codec().decode(c))
            .transpose()?;
        Ok(request.before(before))
    }

    /// Default projection for a query: its filter list, identity kept
    pub fn projection(&self, spec: &QuerySpec) -> Projection {
        Projection::new(self.schema.identity.public).fields(&spec.filter)
    }

    /// One page in descending identity order
    ///
    /// Asks the source for `limit + 1` records; the extra record only
    /// signals that a further page exists.
    pub async fn find(
        &self,
        spec: &QuerySpec,
        projection: &Projection,
        self_uri: &str,
    ) -> Result<PageResult> {
        let request = self.request(spec)?;
        self.find_with(request, spec.limit, projection, self_uri).await
    }

    /// Like `find`, for a request built by the caller
    pub async fn find_with(
        &self,
        request: FetchRequest,
        limit: usize,
        projection: &Projection,
        self_uri: &str,
    ) -> Result<PageResult> {
        let paginator = ProbePaginator::new(limit, self.schema.codec());
        let request = request
            .order(SortOrder::Descending)
            .limit(paginator.fetch_size());

        let fetched = self.source.fetch(&request).await?;
        let page = paginator.paginate(fetched, self_uri)?;
        let items = project(&page.items, projection);
        Ok(page.with_items(items))
    }

    /// Every matching record, no pagination
    pub async fn all(&self, request: FetchRequest) -> Result<Vec<Record>> {
        self.source.fetch(&request).await
    }
}
