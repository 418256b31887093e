use sqlx::{QueryBuilder, Sqlite};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{CaseFilters, CaseRecord};

const SELECT_CASES: &str = "
    SELECT c.id, c.case_no, c.template_id, t.name AS template_name, c.title, c.status,
           c.created_at, c.updated_at, c.is_deleted, c.deleted_at
    FROM cases c
    JOIN templates t ON t.id = c.template_id";

pub const LIST_LIMIT: i64 = 200;

/// Values for a new case and its data row.
#[derive(Debug, Clone)]
pub struct NewCase<'a> {
    pub id: &'a str,
    pub case_no: &'a str,
    pub template_id: &'a str,
    pub title: &'a str,
    pub status: Option<&'a str>,
    pub created_at: &'a str,
    pub data_id: &'a str,
    pub data_json: &'a str,
}

#[derive(Clone)]
pub struct CaseRepository {
    db: DatabaseManager,
}

impl CaseRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    /// Newest first, capped at [`LIST_LIMIT`] rows.
    pub async fn list(&self, filters: &CaseFilters) -> Result<Vec<CaseRecord>, DatabaseError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_CASES);
        query.push(" WHERE 1 = 1");

        if !filters.include_deleted() {
            query.push(" AND c.is_deleted = 0");
        }
        if let Some(template_id) = &filters.template_id {
            query.push(" AND c.template_id = ").push_bind(template_id.clone());
        }
        if let Some(keyword) = &filters.keyword {
            query.push(" AND c.title LIKE ").push_bind(format!("%{}%", keyword));
        }
        if let Some(from) = &filters.from {
            query.push(" AND c.created_at >= ").push_bind(from.clone());
        }
        if let Some(to) = &filters.to {
            query.push(" AND c.created_at <= ").push_bind(to.clone());
        }
        query
            .push(" ORDER BY c.created_at DESC, c.rowid DESC LIMIT ")
            .push_bind(LIST_LIMIT);

        tracing::debug!("case list query: {}", query.sql());
        let cases = query.build_query_as::<CaseRecord>().fetch_all(self.db.pool()).await?;
        Ok(cases)
    }

    /// Live (not soft-deleted) case by id.
    pub async fn get(&self, id: &str) -> Result<Option<CaseRecord>, DatabaseError> {
        let sql = format!("{} WHERE c.id = ? AND c.is_deleted = 0", SELECT_CASES);
        let case = sqlx::query_as::<_, CaseRecord>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(case)
    }

    pub async fn get_data(&self, case_id: &str) -> Result<Option<String>, DatabaseError> {
        let raw = sqlx::query_scalar::<_, String>("SELECT data_json FROM case_data WHERE case_id = ?")
            .bind(case_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(raw)
    }

    /// Case row and data row are written in one transaction.
    pub async fn create(&self, new_case: &NewCase<'_>) -> Result<(), DatabaseError> {
        let pool = self.db.pool();
        let c = new_case;
        self.db
            .with_retry(move || async move {
                let mut tx = pool.begin().await?;
                sqlx::query(
                    "INSERT INTO cases (
                       id, case_no, template_id, title, status, created_at, updated_at, is_deleted
                     ) VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
                )
                .bind(c.id)
                .bind(c.case_no)
                .bind(c.template_id)
                .bind(c.title)
                .bind(c.status)
                .bind(c.created_at)
                .bind(c.created_at)
                .execute(&mut *tx)
                .await?;
                sqlx::query("INSERT INTO case_data (id, case_id, data_json) VALUES (?, ?, ?)")
                    .bind(c.data_id)
                    .bind(c.id)
                    .bind(c.data_json)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await
            })
            .await
    }

    /// Updates the case and upserts its data atomically. Returns 0 (and
    /// writes nothing) when the case is missing or soft-deleted.
    pub async fn update(
        &self,
        id: &str,
        title: &str,
        status: Option<&str>,
        data_json: &str,
        now: &str,
    ) -> Result<u64, DatabaseError> {
        let pool = self.db.pool();
        let data_id = crate::types::new_id();
        let data_id = data_id.as_str();

        self.db
            .with_retry(move || async move {
                let mut tx = pool.begin().await?;
                let changed = sqlx::query(
                    "UPDATE cases SET title = ?, status = ?, updated_at = ?
                     WHERE id = ? AND is_deleted = 0",
                )
                .bind(title)
                .bind(status)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

                if changed == 0 {
                    tx.rollback().await?;
                    return Ok::<u64, sqlx::Error>(0);
                }

                sqlx::query(
                    "INSERT INTO case_data (id, case_id, data_json) VALUES (?, ?, ?)
                     ON CONFLICT(case_id) DO UPDATE SET data_json = excluded.data_json",
                )
                .bind(data_id)
                .bind(id)
                .bind(data_json)
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;
                Ok::<u64, sqlx::Error>(changed)
            })
            .await
    }

    pub async fn soft_delete(&self, id: &str, now: &str) -> Result<u64, DatabaseError> {
        let pool = self.db.pool();
        let result = self
            .db
            .with_retry(|| {
                sqlx::query(
                    "UPDATE cases SET is_deleted = 1, deleted_at = ?, updated_at = ?
                     WHERE id = ? AND is_deleted = 0",
                )
                .bind(now)
                .bind(now)
                .bind(id)
                .execute(pool)
            })
            .await?;
        Ok(result.rows_affected())
    }
}
