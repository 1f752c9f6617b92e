//! Pagination types

use crate::types::{JsonObject, JsonValue, Link, Record};

/// Whether another page follows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More records exist after this cursor
    Continue {
        /// Cursor to hand back as `offset`
        cursor: String,
        /// Request URI rewritten with the cursor
        href: String,
    },
    /// This was the terminal page
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// One page of records plus its navigation
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// At most `limit` records, in fetch order
    pub items: Vec<Record>,
    /// Original request URI
    pub self_link: String,
    pub next: NextPage,
}

impl PageResult {
    pub fn next_cursor(&self) -> Option<&str> {
        match &self.next {
            NextPage::Continue { cursor, .. } => Some(cursor),
            NextPage::Done => None,
        }
    }

    pub fn next_link(&self) -> Option<&str> {
        match &self.next {
            NextPage::Continue { href, .. } => Some(href),
            NextPage::Done => None,
        }
    }

    /// Self link, then next link when one exists
    pub fn links(&self) -> Vec<Link> {
        let mut links = vec![Link::self_link(&self.self_link)];
        if let Some(href) = self.next_link() {
            links.push(Link::next(href));
        }
        links
    }

    /// Transform every item, keeping navigation
    #[must_use]
    pub fn map_items<F>(self, f: F) -> Self
    where
        F: FnMut(Record) -> Record,
    {
        Self {
            items: self.items.into_iter().map(f).collect(),
            ..self
        }
    }

    /// Replace the items wholesale, keeping navigation
    #[must_use]
    pub fn with_items(self, items: Vec<Record>) -> Self {
        Self { items, ..self }
    }

    /// `{key: [items], offset?, links}`
    pub fn into_envelope(self, key: &str) -> JsonObject {
        let items = JsonValue::Array(self.items.iter().cloned().map(JsonValue::Object).collect());
        self.envelope_with(key, items)
    }

    /// `{key: payload, offset?, links}` for payloads that are not item lists
    pub fn envelope_with(&self, key: &str, payload: JsonValue) -> JsonObject {
        let mut body = JsonObject::new();
        body.insert(key.to_string(), payload);
        if let Some(cursor) = self.next_cursor() {
            body.insert("offset".to_string(), JsonValue::String(cursor.to_string()));
        }
        let links = self
            .links()
            .into_iter()
            .map(|l| serde_json::json!({"href": l.href, "rel": l.rel}))
            .collect();
        body.insert("links".to_string(), JsonValue::Array(links));
        body
    }
}
