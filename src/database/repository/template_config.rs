use crate::database::manager::{DatabaseError, DatabaseManager};

/// Raw storage for template layout documents; decoding lives with the caller.
#[derive(Clone)]
pub struct TemplateConfigRepository {
    db: DatabaseManager,
}

impl TemplateConfigRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    pub async fn get(&self, template_id: &str) -> Result<Option<String>, DatabaseError> {
        let raw = sqlx::query_scalar::<_, String>("SELECT config_json FROM template_config WHERE template_id = ?")
            .bind(template_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(raw)
    }

    pub async fn upsert(&self, template_id: &str, config_json: &str, now: &str) -> Result<(), DatabaseError> {
        let pool = self.db.pool();
        self.db
            .with_retry(|| {
                sqlx::query(
                    "INSERT INTO template_config (template_id, config_json, updated_at)
                     VALUES (?, ?, ?)
                     ON CONFLICT(template_id) DO UPDATE
                     SET config_json = excluded.config_json, updated_at = excluded.updated_at",
                )
                .bind(template_id)
                .bind(config_json)
                .bind(now)
                .execute(pool)
            })
            .await?;
        Ok(())
    }
}
