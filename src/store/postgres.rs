/// Postgres 문서 저장소
/// `documents(collection, id, data JSONB)` 테이블 하나에 모든 컬렉션을 저장한다.
/// 필드 이름과 값은 모두 바인딩 파라미터로 전달한다.
// region:    --- Imports
use super::{Document, DocumentStore, FieldValue, Filter, Page, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::sync::Arc;
use tracing::debug;

// endregion: --- Imports

// region:    --- Postgres Store
pub struct PostgresDocumentStore {
    pool: Arc<PgPool>,
}

impl PostgresDocumentStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 문서 저장 (있으면 덮어쓰기)
    pub async fn insert(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (collection, id, data)
             VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()",
        )
        .bind(collection)
        .bind(id)
        .bind(data)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Document::new(collection, id, row.try_get("data")?))),
            None => Ok(None),
        }
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        page: Page,
    ) -> Result<Vec<Document>, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, data FROM documents WHERE collection = ");
        builder.push_bind(collection.to_string());
        push_conditions(&mut builder, filters);
        if let Some(cursor) = page.start_after {
            builder.push(" AND id > ").push_bind(cursor);
        }
        builder
            .push(" ORDER BY id LIMIT ")
            .push_bind(i64::try_from(page.limit).unwrap_or(i64::MAX));

        debug!("{:<12} --> query: {}", "Store", builder.sql());
        let rows = builder.build().fetch_all(&*self.pool).await?;

        rows.into_iter()
            .map(|row| -> Result<Document, StoreError> {
                Ok(Document::new(
                    collection,
                    row.try_get::<String, _>("id")?,
                    row.try_get::<Value, _>("data")?,
                ))
            })
            .collect()
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        conditions: &[Filter],
        patch: Value,
    ) -> Result<bool, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE documents SET updated_at = NOW(), data = data || ");
        builder
            .push_bind(patch)
            .push(" WHERE collection = ")
            .push_bind(collection.to_string())
            .push(" AND id = ")
            .push_bind(id.to_string());
        push_conditions(&mut builder, conditions);

        let result = builder.build().execute(&*self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
// endregion: --- Postgres Store

// region:    --- Filter Compilation
/// 필터를 ` AND <field expr> <op> <value>` 형태로 추가
/// 형식이 맞지 않는 값은 오류 대신 매칭되지 않는다.
/// 불리언 비교는 부분 인덱스 조건(`(data -> 'field') = 'false'::jsonb`)과 같은 형태로 만든다.
fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) {
    for filter in filters {
        let (field, op, value) = match filter {
            Filter::Eq(field, value) => (field, "=", value),
            Filter::Ne(field, value) => (field, "IS DISTINCT FROM", value),
            Filter::Lte(field, value) => (field, "<=", value),
        };
        match value {
            FieldValue::Bool(b) => {
                builder.push(" AND (data -> ");
                push_field(builder, field);
                builder
                    .push(") ")
                    .push(op)
                    .push(if *b { " 'true'::jsonb" } else { " 'false'::jsonb" });
            }
            FieldValue::Text(s) => {
                builder.push(" AND (data ->> ");
                push_field(builder, field);
                builder.push(") ").push(op).push(" ").push_bind(s.clone());
            }
            FieldValue::Timestamp(ts) => {
                builder.push(" AND safe_timestamptz(data ->> ");
                push_field(builder, field);
                builder.push(") ").push(op).push(" ").push_bind(*ts);
            }
        }
    }
}

/// 필드 이름: 식별자 문자만 있으면 리터럴로, 아니면 바인딩으로
fn push_field(builder: &mut QueryBuilder<'_, Postgres>, field: &str) {
    let is_identifier = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_identifier {
        builder.push("'").push(field).push("'");
    } else {
        builder.push_bind(field.to_string());
    }
}
// endregion: --- Filter Compilation

// endregion: --- Tests
