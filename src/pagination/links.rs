//! Link rewriting

use crate::query::RawQuery;
use crate::types::{JsonValue, Link, QueryPairs};
use url::form_urlencoded;

const CURSOR_PARAM: &str = "offset";
const LIMIT_PARAM: &str = "limit";

/// Split a URI into the part before `?` and the query, if any
pub fn split_uri(uri: &str) -> (&str, Option<&str>) {
    let uri = uri.split('#').next().unwrap_or(uri);
    match uri.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (uri, None),
    }
}

fn segment_key(segment: &str) -> String {
    let raw = segment.split('=').next().unwrap_or(segment);
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(k, _)| k.into_owned())
        .unwrap_or_default()
}

fn encode_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// `uri` with any previous cursor removed and `offset=<cursor>` inserted
///
/// The cursor goes first; the remaining parameters follow in their original
/// order and encoding.
pub fn with_cursor(uri: &str, cursor: &str) -> String {
    let (base, query) = split_uri(uri);
    let mut out = format!("{base}?{CURSOR_PARAM}={}", encode_value(cursor));

    for segment in query
        .into_iter()
        .flat_map(|q| q.split('&'))
        .filter(|s| !s.is_empty())
        .filter(|s| segment_key(s) != CURSOR_PARAM)
    {
        out.push('&');
        out.push_str(segment);
    }
    out
}

fn backend_next_href(href: &str, request_uri: &str, params: &RawQuery) -> String {
    let (_, backend_query) = split_uri(href);
    let backend = RawQuery::parse(backend_query);

    let mut pairs: QueryPairs = Vec::new();
    for key in [CURSOR_PARAM, LIMIT_PARAM] {
        if let Some(value) = backend.first(key) {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs.extend(params.without(&[CURSOR_PARAM, LIMIT_PARAM]));

    let (base, _) = split_uri(request_uri);
    if pairs.is_empty() {
        return base.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish();
    format!("{base}?{query}")
}

/// Rewrite a backend's own `links` array to point at the gateway
///
/// `self` becomes the request URI. `next` keeps the backend's cursor and
/// limit and carries the client's other parameters after them.
pub fn rewrite_backend_links(
    links: Option<&JsonValue>,
    request_uri: &str,
    params: &RawQuery,
) -> Vec<Link> {
    let Some(JsonValue::Array(links)) = links else {
        return Vec::new();
    };

    links
        .iter()
        .filter_map(|link| {
            let rel = link.get("rel")?.as_str()?;
            let href = link.get("href").and_then(JsonValue::as_str).unwrap_or_default();
            let href = match rel {
                "self" => request_uri.to_string(),
                "next" => backend_next_href(href, request_uri, params),
                _ => href.to_string(),
            };
            Some(Link {
                href,
                rel: rel.to_string(),
            })
        })
        .collect()
}
