//! Tests for pagination module

use super::*;
use crate::cursor::{CursorCodec, CursorKind};
use crate::query::{normalize, LimitPolicy, RawQuery};
use crate::types::Record;
use pretty_assertions::assert_eq;
use serde_json::json;

const BASE: &str = "http://gw/nbi/autonomous/api/symptom";

fn numbered(ids: std::ops::RangeInclusive<i64>) -> Vec<Record> {
    ids.rev()
        .map(|id| json!({"id": id, "hash": format!("h{id}")}).as_object().cloned().unwrap())
        .collect()
}

fn ids(page: &PageResult) -> Vec<i64> {
    page.items.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

/// Records strictly before the cursor, at most `n`
fn fetch(all: &[Record], codec: &CursorCodec, cursor: Option<&str>, n: usize) -> Vec<Record> {
    let predicate = cursor.map(|c| codec.decode(c).unwrap());
    all.iter()
        .filter(|r| predicate.as_ref().map_or(true, |p| p.admits(r)))
        .take(n)
        .cloned()
        .collect()
}

// ============================================================================
// NextPage Tests
// ============================================================================

#[test]
fn test_next_page_states() {
    let next = NextPage::Continue {
        cursor: "8".into(),
        href: "x".into(),
    };
    assert!(next.is_continue());
    assert!(!next.is_done());
    assert!(NextPage::Done.is_done());
}

// ============================================================================
// ProbePaginator Tests
// ============================================================================

#[test]
fn test_more_than_limit_yields_cursor() {
    let paginator = ProbePaginator::new(5, CursorCodec::new(CursorKind::RowId, "id"));
    assert_eq!(paginator.fetch_size(), 6);

    let page = paginator.paginate(numbered(1..=6), BASE).unwrap();
    assert_eq!(ids(&page), vec![6, 5, 4, 3, 2]);
    assert_eq!(page.next_cursor(), Some("2"));
    assert_eq!(page.next_link(), Some("http://gw/nbi/autonomous/api/symptom?offset=2"));
}

#[test]
fn test_at_most_limit_is_terminal() {
    let paginator = ProbePaginator::new(5, CursorCodec::new(CursorKind::RowId, "id"));
    let page = paginator.paginate(numbered(1..=5), BASE).unwrap();
    assert_eq!(page.items.len(), 5);
    assert!(page.next.is_done());
    assert_eq!(page.links().len(), 1);
}

#[test]
fn test_empty_fetch_is_terminal() {
    let paginator = ProbePaginator::new(5, CursorCodec::new(CursorKind::RowId, "id"));
    let page = paginator.paginate(Vec::new(), BASE).unwrap();
    assert!(page.items.is_empty());
    assert!(page.next_cursor().is_none());
}

#[test]
fn test_twelve_records_three_pages() {
    let all = numbered(1..=12);
    let codec = CursorCodec::new(CursorKind::RowId, "id");
    let paginator = ProbePaginator::new(5, codec.clone());

    let page1 = paginator
        .paginate(fetch(&all, &codec, None, paginator.fetch_size()), BASE)
        .unwrap();
    assert_eq!(ids(&page1), vec![12, 11, 10, 9, 8]);
    assert_eq!(page1.next_cursor(), Some("8"));

    let page2 = paginator
        .paginate(fetch(&all, &codec, page1.next_cursor(), paginator.fetch_size()), BASE)
        .unwrap();
    assert_eq!(ids(&page2), vec![7, 6, 5, 4, 3]);
    assert_eq!(page2.next_cursor(), Some("3"));

    let page3 = paginator
        .paginate(fetch(&all, &codec, page2.next_cursor(), paginator.fetch_size()), BASE)
        .unwrap();
    assert_eq!(ids(&page3), vec![2, 1]);
    assert!(page3.next_cursor().is_none());
}

#[test]
fn test_following_cursor_never_repeats() {
    let all = numbered(1..=23);
    let codec = CursorCodec::new(CursorKind::RowId, "id");
    for limit in 1..=24 {
        let paginator = ProbePaginator::new(limit, codec.clone());
        let mut seen: Vec<i64> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = paginator
                .paginate(fetch(&all, &codec, cursor.as_deref(), paginator.fetch_size()), BASE)
                .unwrap();
            for id in ids(&page) {
                assert!(!seen.contains(&id), "limit {limit} repeated {id}");
                seen.push(id);
            }
            match page.next_cursor() {
                Some(c) => cursor = Some(c.to_string()),
                None => break,
            }
        }
        assert_eq!(seen.len(), 23, "limit {limit}");
    }
}

#[test]
fn test_envelope_shape() {
    let paginator = ProbePaginator::new(1, CursorCodec::new(CursorKind::RowId, "id"));
    let page = paginator.paginate(numbered(1..=2), BASE).unwrap();
    let body = page.into_envelope("symptoms");

    assert_eq!(
        serde_json::Value::Object(body),
        json!({
            "symptoms": [{"id": 2, "hash": "h2"}],
            "offset": "2",
            "links": [
                {"href": BASE, "rel": "self"},
                {"href": format!("{BASE}?offset=2"), "rel": "next"}
            ]
        })
    );
}

#[test]
fn test_envelope_without_next_has_no_offset() {
    let paginator = ProbePaginator::new(5, CursorCodec::new(CursorKind::RowId, "id"));
    let body = paginator.paginate(numbered(1..=2), BASE).unwrap().into_envelope("tal");
    assert!(!body.contains_key("offset"));
    assert_eq!(body["links"].as_array().unwrap().len(), 1);
}

// ============================================================================
// Link rewriting
// ============================================================================

#[test]
fn test_with_cursor_no_query() {
    assert_eq!(with_cursor(BASE, "abc"), format!("{BASE}?offset=abc"));
}

#[test]
fn test_with_cursor_replaces_existing_offset() {
    let uri = format!("{BASE}?limit=5&offset=old&filter=hash");
    assert_eq!(
        with_cursor(&uri, "new"),
        format!("{BASE}?offset=new&limit=5&filter=hash")
    );
}

#[test]
fn test_with_cursor_offset_only_query() {
    let uri = format!("{BASE}?offset=old");
    assert_eq!(with_cursor(&uri, "new"), format!("{BASE}?offset=new"));
}

#[test]
fn test_with_cursor_keeps_similar_keys() {
    let uri = format!("{BASE}?offset_hint=1&myoffset=2");
    assert_eq!(
        with_cursor(&uri, "9"),
        format!("{BASE}?offset=9&offset_hint=1&myoffset=2")
    );
}

#[test]
fn test_rewritten_link_round_trips_through_normalizer() {
    let original = format!(
        "{BASE}?search_by=symptom_id%3Dddos%2Chash%3Dabc&filter=hash&filter=symptom&limit=5&offset=5a1b2c3d4e5f60718293a4b5"
    );
    let rewritten = with_cursor(&original, "5a1b2c3d4e5f60718293a4b0");

    let (_, q1) = split_uri(&original);
    let (_, q2) = split_uri(&rewritten);
    let before = normalize(&RawQuery::parse(q1), LimitPolicy::SYMPTOMS).unwrap();
    let after = normalize(&RawQuery::parse(q2), LimitPolicy::SYMPTOMS).unwrap();

    assert_eq!(before.search_by, after.search_by);
    assert_eq!(before.filter, after.filter);
    assert_eq!(before.limit, after.limit);
    assert_eq!(after.cursor.as_deref(), Some("5a1b2c3d4e5f60718293a4b0"));
}

#[test]
fn test_backend_links_rewritten() {
    let links = json!([
        {"rel": "self", "href": "http://monasca:8070/v2.0/alarms?limit=5"},
        {"rel": "next", "href": "http://monasca:8070/v2.0/alarms?offset=111&limit=5"}
    ]);
    let request_uri = "http://gw/nbi/monitoring/api/alarms?state=ALARM&limit=5";
    let params = RawQuery::parse(Some("state=ALARM&limit=5"));

    let rewritten = rewrite_backend_links(Some(&links), request_uri, &params);
    assert_eq!(rewritten.len(), 2);
    assert_eq!(rewritten[0].href, request_uri);
    assert_eq!(
        rewritten[1].href,
        "http://gw/nbi/monitoring/api/alarms?offset=111&limit=5&state=ALARM"
    );
}

#[test]
fn test_backend_links_missing() {
    let params = RawQuery::default();
    assert!(rewrite_backend_links(None, "http://gw/a", &params).is_empty());
}
