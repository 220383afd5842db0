use chrono::{Duration, Utc};
use marketplace_notifier::database::DatabaseManager;
use marketplace_notifier::store::{DocumentStore, Filter, Page, PostgresDocumentStore};
use serde_json::json;

/// 데이터베이스 설정
async fn setup() -> PostgresDocumentStore {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db_manager = DatabaseManager::connect(&database_url, 2)
        .await
        .expect("Failed to create pool");
    db_manager
        .initialize_database()
        .await
        .expect("Failed to create schema");
    PostgresDocumentStore::new(db_manager.get_pool())
}

/// 조건부 업데이트와 시각 비교
#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_store_matches_memory_semantics() {
    let store = setup().await;
    let collection = format!("bids-test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let now = Utc::now();
    let past_kst = (now - Duration::minutes(30))
        .with_timezone(&chrono::FixedOffset::east_opt(9 * 3600).unwrap())
        .to_rfc3339();
    let future = (now + Duration::minutes(30)).to_rfc3339();

    store
        .insert(&collection, "A1", json!({ "bidFinalized": false, "bidEndTime": past_kst }))
        .await
        .unwrap();
    store
        .insert(&collection, "A2", json!({ "bidFinalized": false, "bidEndTime": future }))
        .await
        .unwrap();
    store
        .insert(&collection, "A3", json!({ "bidFinalized": "no", "bidEndTime": "yesterday" }))
        .await
        .unwrap();

    let filters = [
        Filter::eq("bidFinalized", false),
        Filter::lte("bidEndTime", now),
    ];
    let due = store.query(&collection, &filters, Page::first(10)).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, "A1");

    let guard = [Filter::eq("bidFinalized", false)];
    let patch = json!({ "bidFinalized": true });
    assert!(store.update(&collection, "A1", &guard, patch.clone()).await.unwrap());
    assert!(!store.update(&collection, "A1", &guard, patch).await.unwrap());

    let again = store.query(&collection, &filters, Page::first(10)).await.unwrap();
    assert!(again.is_empty());

    assert!(store.delete(&collection, "A1").await.unwrap());
    assert!(!store.delete(&collection, "A1").await.unwrap());
    assert!(store.delete(&collection, "A2").await.unwrap());
    assert!(store.delete(&collection, "A3").await.unwrap());
}

/// 잘못된 종료 시각이 섞여 있어도 조회는 성공하고 정상 경매만 선택
#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_invalid_end_times_do_not_break_selection() {
    let store = setup().await;
    let collection = format!("bids-bad-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let expired = (Utc::now() - Duration::hours(1)).to_rfc3339();

    let records = [
        ("A1", json!(expired)),
        ("A2", json!("2020-02-30T10:00:00Z")),
        ("A3", json!("2020-01-01T00:00:00Zjunk")),
        ("A4", json!("2020-01-01T00:00:00")),
        ("A5", json!(1_577_836_800)),
    ];
    for (id, end_time) in &records {
        store
            .insert(&collection, id, json!({ "bidFinalized": false, "bidEndTime": end_time }))
            .await
            .unwrap();
    }

    let filters = [
        Filter::eq("bidFinalized", false),
        Filter::lte("bidEndTime", Utc::now()),
    ];
    let due = store
        .query(&collection, &filters, Page::first(10))
        .await
        .expect("selection must not fail on malformed values");
    let ids: Vec<_> = due.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["A1"]);

    for (id, _) in &records {
        store.delete(&collection, id).await.unwrap();
    }
}
