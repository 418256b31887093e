use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Template;

#[derive(Clone)]
pub struct TemplateRepository {
    db: DatabaseManager,
}

impl TemplateRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Template>, DatabaseError> {
        let templates = sqlx::query_as::<_, Template>(
            "SELECT id, name, description, created_at FROM templates ORDER BY created_at DESC, name ASC",
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(templates)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Template>, DatabaseError> {
        let template = sqlx::query_as::<_, Template>(
            "SELECT id, name, description, created_at FROM templates WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(template)
    }

    pub async fn insert(&self, template: &Template) -> Result<(), DatabaseError> {
        let pool = self.db.pool();
        self.db
            .with_retry(|| {
                sqlx::query("INSERT INTO templates (id, name, description, created_at) VALUES (?, ?, ?, ?)")
                    .bind(&template.id)
                    .bind(&template.name)
                    .bind(template.description.as_deref())
                    .bind(&template.created_at)
                    .execute(pool)
            })
            .await?;
        Ok(())
    }

    pub async fn update(&self, id: &str, name: &str, description: Option<&str>) -> Result<u64, DatabaseError> {
        let pool = self.db.pool();
        let result = self
            .db
            .with_retry(|| {
                sqlx::query("UPDATE templates SET name = ?, description = ? WHERE id = ?")
                    .bind(name)
                    .bind(description)
                    .bind(id)
                    .execute(pool)
            })
            .await?;
        Ok(result.rows_affected())
    }

    /// Cases referencing the template, soft-deleted ones included.
    pub async fn count_cases(&self, id: &str) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cases WHERE template_id = ?")
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Fields and config go with the template; cases keep it alive (FK restrict).
    pub async fn delete(&self, id: &str) -> Result<u64, DatabaseError> {
        let pool = self.db.pool();
        let result = self
            .db
            .with_retry(|| sqlx::query("DELETE FROM templates WHERE id = ?").bind(id).execute(pool))
            .await?;
        Ok(result.rows_affected())
    }
}
