/// 문서 저장소 추상화
/// 컬렉션 + 키 조회, 필터 조회, 조건부 업데이트, 삭제 네 가지 연산만 사용한다.
/// 운영 환경은 Postgres(JSONB), 테스트는 메모리 구현체를 사용한다.
// region:    --- Imports
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PostgresDocumentStore;

// endregion: --- Imports

// region:    --- Collections
/// 컬렉션 이름
pub mod collections {
    /// 경매(입찰) 레코드
    pub const AUCTIONS: &str = "bids";
    pub const LISTINGS: &str = "listings";
    pub const USERS: &str = "users";
    pub const ORDERS: &str = "orders";
}
// endregion: --- Collections

// region:    --- Errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to decode {collection}/{id}: {source}")]
    Decode {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
// endregion: --- Errors

// region:    --- Document Model
/// 저장소에서 읽어온 문서
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub collection: String,
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(collection: impl Into<String>, id: impl Into<String>, data: Value) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            data,
        }
    }

    /// 문서 본문을 도메인 타입으로 변환
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone()).map_err(|source| StoreError::Decode {
            collection: self.collection.clone(),
            id: self.id.clone(),
            source,
        })
    }
}

/// 필터 비교 값
///
/// 타임스탬프는 문자열이 아닌 시각으로 비교한다.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// 조회/업데이트 조건
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, FieldValue),
    /// 필드가 없거나 값이 다르면 매칭
    Ne(String, FieldValue),
    Lte(String, FieldValue),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<FieldValue>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn ne(field: &str, value: impl Into<FieldValue>) -> Self {
        Filter::Ne(field.to_string(), value.into())
    }

    pub fn lte(field: &str, value: impl Into<FieldValue>) -> Self {
        Filter::Lte(field.to_string(), value.into())
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(field, _) | Filter::Ne(field, _) | Filter::Lte(field, _) => field,
        }
    }
}

/// 키 기준 페이지 (id 오름차순, `start_after` 이후부터 `limit` 건)
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub limit: usize,
    pub start_after: Option<String>,
}

impl Page {
    pub fn first(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            start_after: None,
        }
    }

    pub fn after(limit: usize, cursor: Option<String>) -> Self {
        Self {
            limit: limit.max(1),
            start_after: cursor,
        }
    }
}
// endregion: --- Document Model

// region:    --- Document Store Trait
/// 문서 저장소 트레이트
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 단건 조회 (없으면 None)
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// 필터 조회, id 오름차순
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        page: Page,
    ) -> Result<Vec<Document>, StoreError>;

    /// 부분 업데이트. `conditions`를 모두 만족할 때만 적용되며 적용 여부를 반환한다.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        conditions: &[Filter],
        patch: Value,
    ) -> Result<bool, StoreError>;

    /// 삭제. 문서가 없어도 성공이며, 실제로 지웠는지 여부를 반환한다.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;
}
// endregion: --- Document Store Trait
