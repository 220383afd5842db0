use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;

pub struct DatabaseManager {
    pub pool: Arc<PgPool>,
}

impl DatabaseManager {
    /// 데이터베이스 매니저 생성
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// 데이터베이스 풀 가져오기
    pub fn get_pool(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    /// 스키마 생성 (이미 있으면 유지)
    pub async fn initialize_database(&self) -> Result<(), sqlx::Error> {
        let create_schema_sql = include_str!("../sql/01-create-schema.sql");
        self.execute_multi_query(create_schema_sql).await
    }

    /// 여러 쿼리 실행
    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        for query in split_statements(sql) {
            sqlx::query(&query).execute(&*self.pool).await?;
        }
        Ok(())
    }
}

/// `;` 기준으로 문장 분리 (`$$ ... $$` 함수 본문 안의 `;`는 유지)
fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_body = false;
    for (i, segment) in sql.split("$$").enumerate() {
        if i > 0 {
            current.push_str("$$");
            in_body = !in_body;
        }
        if in_body {
            current.push_str(segment);
            continue;
        }
        let mut parts = segment.split(';');
        if let Some(first) = parts.next() {
            current.push_str(first);
        }
        for part in parts {
            statements.push(std::mem::take(&mut current));
            current.push_str(part);
        }
    }
    statements.push(current);

    statements
        .iter()
        .map(|statement| strip_comments(statement))
        .filter(|statement| !statement.is_empty())
        .collect()
}

/// `--` 주석 줄 제거
fn strip_comments(sql: &str) -> String {
    sql.lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_splits_into_statements_without_comments() {
        let statements = split_statements(include_str!("../sql/01-create-schema.sql"));

        assert_eq!(statements.len(), 4);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS documents"));
        assert!(statements.iter().all(|q| !q.contains("--")));
    }

    #[test]
    fn function_body_stays_in_one_statement() {
        let statements = split_statements(include_str!("../sql/01-create-schema.sql"));

        let function = &statements[1];
        assert!(function.starts_with("CREATE OR REPLACE FUNCTION safe_timestamptz"));
        assert!(function.contains("RETURN value::timestamptz;"));
        assert!(function.ends_with("$$ LANGUAGE plpgsql IMMUTABLE"));
    }
}
