/// 메모리 문서 저장소
/// Postgres 구현체와 동일한 조회/업데이트 의미를 가지며 테스트에서 사용한다.
/// 조회 실패, 특정 문서 변경 실패를 주입할 수 있다.
// region:    --- Imports
use super::{Document, DocumentStore, FieldValue, Filter, Page, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

// endregion: --- Imports

// region:    --- Memory Store
#[derive(Default)]
struct State {
    collections: BTreeMap<String, BTreeMap<String, Value>>,
    fail_queries: bool,
    failing_ids: HashSet<String>,
    update_calls: Vec<(String, String)>,
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    state: Mutex<State>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 문서 저장 (덮어쓰기)
    pub fn insert(&self, collection: &str, id: &str, data: Value) {
        self.state()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
    }

    /// 문서 본문 조회 (테스트 검증용)
    pub fn snapshot(&self, collection: &str, id: &str) -> Option<Value> {
        self.state()
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    pub fn contains(&self, collection: &str, id: &str) -> bool {
        self.snapshot(collection, id).is_some()
    }

    /// 이후 모든 query 호출을 실패시킨다
    pub fn fail_queries(&self, fail: bool) {
        self.state().fail_queries = fail;
    }

    /// 해당 id 문서에 대한 update/delete를 실패시킨다
    pub fn fail_mutations_for(&self, id: &str) {
        self.state().failing_ids.insert(id.to_string());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.fail_queries = false;
        state.failing_ids.clear();
    }

    /// 지금까지 호출된 update (collection, id) 목록
    pub fn update_calls(&self) -> Vec<(String, String)> {
        self.state().update_calls.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .snapshot(collection, id)
            .map(|data| Document::new(collection, id, data)))
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        page: Page,
    ) -> Result<Vec<Document>, StoreError> {
        let state = self.state();
        if state.fail_queries {
            return Err(StoreError::Unavailable(format!(
                "query on {collection} rejected"
            )));
        }

        let Some(docs) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .filter(|(id, _)| match &page.start_after {
                Some(cursor) => id.as_str() > cursor.as_str(),
                None => true,
            })
            .filter(|(_, data)| filters.iter().all(|f| matches(data, f)))
            .take(page.limit)
            .map(|(id, data)| Document::new(collection, id.clone(), data.clone()))
            .collect())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        conditions: &[Filter],
        patch: Value,
    ) -> Result<bool, StoreError> {
        let mut state = self.state();
        state
            .update_calls
            .push((collection.to_string(), id.to_string()));
        if state.failing_ids.contains(id) {
            return Err(StoreError::Unavailable(format!(
                "update on {collection}/{id} rejected"
            )));
        }

        let Some(current) = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
        else {
            return Ok(false);
        };
        if !conditions.iter().all(|c| matches(current, c)) {
            return Ok(false);
        }

        merge(current, patch);
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut state = self.state();
        if state.failing_ids.contains(id) {
            return Err(StoreError::Unavailable(format!(
                "delete on {collection}/{id} rejected"
            )));
        }
        Ok(state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some())
    }
}
// endregion: --- Memory Store

// region:    --- Filter Evaluation
/// jsonb `||` 와 같은 얕은 병합
fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                target.insert(key, value);
            }
        }
        (target, patch) => *target = patch,
    }
}

/// RFC 3339 (`T` 구분자, 오프셋 필수)만 시각으로 인정
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .filter(|s| matches!(s.as_bytes().get(10), Some(b'T' | b't')))
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

fn matches(data: &Value, filter: &Filter) -> bool {
    let field = data.get(filter.field());
    match filter {
        Filter::Eq(_, expected) => field.is_some_and(|f| equals(f, expected)),
        Filter::Ne(_, expected) => !field.is_some_and(|f| equals(f, expected)),
        Filter::Lte(_, bound) => field.is_some_and(|f| at_most(f, bound)),
    }
}

fn equals(field: &Value, expected: &FieldValue) -> bool {
    match expected {
        FieldValue::Bool(expected) => field.as_bool() == Some(*expected),
        FieldValue::Text(expected) => field.as_str() == Some(expected.as_str()),
        FieldValue::Timestamp(expected) => parse_timestamp(field).is_some_and(|ts| ts == *expected),
    }
}

fn at_most(field: &Value, bound: &FieldValue) -> bool {
    match bound {
        FieldValue::Bool(bound) => field.as_bool().is_some_and(|b| b <= *bound),
        FieldValue::Text(bound) => field.as_str().is_some_and(|s| s <= bound.as_str()),
        FieldValue::Timestamp(bound) => parse_timestamp(field).is_some_and(|ts| ts <= *bound),
    }
}
// endregion: --- Filter Evaluation

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn timestamps_compare_chronologically_across_offsets() {
        let store = MemoryDocumentStore::new();
        // 11:30 UTC, 문자열로는 now보다 크다
        store.insert("bids", "a", json!({ "bidEndTime": "2025-03-01T20:30:00+09:00" }));
        // 13:00 UTC, 문자열로는 now보다 작다
        store.insert("bids", "b", json!({ "bidEndTime": "2025-03-01T08:00:00-05:00" }));

        let docs = store
            .query("bids", &[Filter::lte("bidEndTime", now())], Page::first(10))
            .await
            .unwrap();

        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[tokio::test]
    async fn invalid_or_offsetless_timestamps_never_match() {
        let store = MemoryDocumentStore::new();
        store.insert("bids", "a", json!({ "bidEndTime": "2020-02-30T10:00:00Z" }));
        store.insert("bids", "b", json!({ "bidEndTime": "2020-01-01T00:00:00Zjunk" }));
        store.insert("bids", "c", json!({ "bidEndTime": "2020-01-01T00:00:00" }));
        store.insert("bids", "d", json!({ "bidEndTime": "2020-01-01 00:00:00Z" }));
        store.insert("bids", "e", json!({ "bidEndTime": "2020-01-01T00:00:00Z" }));

        let docs = store
            .query("bids", &[Filter::lte("bidEndTime", now())], Page::first(10))
            .await
            .unwrap();

        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["e"]);
    }

    #[tokio::test]
    async fn query_pages_by_id_cursor() {
        let store = MemoryDocumentStore::new();
        for id in ["c", "a", "b", "d"] {
            store.insert("bids", id, json!({ "bidFinalized": false }));
        }
        let filters = [Filter::eq("bidFinalized", false)];

        let first = store.query("bids", &filters, Page::first(3)).await.unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[2].id, "c");

        let rest = store
            .query("bids", &filters, Page::after(3, Some("c".to_string())))
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, "d");
    }

    #[tokio::test]
    async fn missing_field_never_matches() {
        let store = MemoryDocumentStore::new();
        store.insert("orders", "o1", json!({ "userId": "u1" }));

        let docs = store
            .query("orders", &[Filter::eq("emailSent", false)], Page::first(10))
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn not_equal_guard_accepts_missing_field() {
        let store = MemoryDocumentStore::new();
        store.insert("orders", "o1", json!({ "userId": "u1" }));
        let guard = [Filter::ne("emailSent", true)];

        let first = store
            .update("orders", "o1", &guard, json!({ "emailSent": true }))
            .await
            .unwrap();
        let second = store
            .update("orders", "o1", &guard, json!({ "emailSent": true }))
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
    }

    #[tokio::test]
    async fn conditional_update_applies_once() {
        let store = MemoryDocumentStore::new();
        store.insert("bids", "a", json!({ "bidFinalized": false, "listingId": "L1" }));
        let guard = [Filter::eq("bidFinalized", false)];

        let first = store
            .update("bids", "a", &guard, json!({ "bidFinalized": true }))
            .await
            .unwrap();
        let second = store
            .update("bids", "a", &guard, json!({ "bidFinalized": true }))
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        assert_eq!(
            store.snapshot("bids", "a"),
            Some(json!({ "bidFinalized": true, "listingId": "L1" }))
        );
        assert_eq!(store.update_calls().len(), 2);
    }

    #[tokio::test]
    async fn delete_of_absent_document_succeeds() {
        let store = MemoryDocumentStore::new();
        assert!(!store.delete("listings", "missing").await.unwrap());
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors() {
        let store = MemoryDocumentStore::new();
        store.insert("listings", "L1", json!({}));
        store.fail_mutations_for("L1");
        store.fail_queries(true);

        assert!(store.delete("listings", "L1").await.is_err());
        assert!(store.query("listings", &[], Page::first(1)).await.is_err());

        store.clear_failures();
        assert!(store.delete("listings", "L1").await.unwrap());
    }
}
// endregion: --- Tests
