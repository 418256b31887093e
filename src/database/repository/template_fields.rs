use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{TemplateField, TemplateFieldInput, TemplateFieldRow};

const SELECT_FIELDS: &str = "
    SELECT
      id, template_id, field_code, field_name, field_type, required,
      default_value, placeholder, help_text, options_json, regex, min, max,
      status, created_at, updated_at
    FROM template_fields";

#[derive(Clone)]
pub struct TemplateFieldRepository {
    db: DatabaseManager,
}

impl TemplateFieldRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    /// Fields in creation order, which is also the default validation order.
    pub async fn list(&self, template_id: &str) -> Result<Vec<TemplateField>, DatabaseError> {
        let sql = format!("{} WHERE template_id = ? ORDER BY created_at ASC, field_code ASC", SELECT_FIELDS);
        let rows = sqlx::query_as::<_, TemplateFieldRow>(&sql)
            .bind(template_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows.into_iter().map(TemplateField::from).collect())
    }

    pub async fn get(&self, template_id: &str, id: &str) -> Result<Option<TemplateField>, DatabaseError> {
        let sql = format!("{} WHERE template_id = ? AND id = ?", SELECT_FIELDS);
        let row = sqlx::query_as::<_, TemplateFieldRow>(&sql)
            .bind(template_id)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(TemplateField::from))
    }

    pub async fn insert(
        &self,
        id: &str,
        template_id: &str,
        input: &TemplateFieldInput,
        now: &str,
    ) -> Result<(), DatabaseError> {
        let pool = self.db.pool();
        let def = &input.definition;
        let field_type = def.field_type.as_str();
        let options_json = input.options_json();
        let default_value = input.default_value_json();
        let (options_json, default_value) = (options_json.as_deref(), default_value.as_deref());

        self.db
            .with_retry(|| {
                sqlx::query(
                    "INSERT INTO template_fields (
                       id, template_id, field_code, field_name, field_type, required,
                       default_value, placeholder, help_text, options_json, regex, min, max,
                       status, created_at, updated_at
                     ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(id)
                .bind(template_id)
                .bind(&def.field_code)
                .bind(&def.field_name)
                .bind(field_type)
                .bind(def.required)
                .bind(default_value)
                .bind(input.placeholder.as_deref())
                .bind(input.help_text.as_deref())
                .bind(options_json)
                .bind(def.regex.as_deref())
                .bind(def.min)
                .bind(def.max)
                .bind(&input.status)
                .bind(now)
                .bind(now)
                .execute(pool)
            })
            .await?;
        Ok(())
    }

    pub async fn update(
        &self,
        id: &str,
        template_id: &str,
        input: &TemplateFieldInput,
        now: &str,
    ) -> Result<u64, DatabaseError> {
        let pool = self.db.pool();
        let def = &input.definition;
        let field_type = def.field_type.as_str();
        let options_json = input.options_json();
        let default_value = input.default_value_json();
        let (options_json, default_value) = (options_json.as_deref(), default_value.as_deref());

        let result = self
            .db
            .with_retry(|| {
                sqlx::query(
                    "UPDATE template_fields
                     SET field_code = ?, field_name = ?, field_type = ?, required = ?, default_value = ?,
                         placeholder = ?, help_text = ?, options_json = ?, regex = ?, min = ?, max = ?,
                         status = ?, updated_at = ?
                     WHERE id = ? AND template_id = ?",
                )
                .bind(&def.field_code)
                .bind(&def.field_name)
                .bind(field_type)
                .bind(def.required)
                .bind(default_value)
                .bind(input.placeholder.as_deref())
                .bind(input.help_text.as_deref())
                .bind(options_json)
                .bind(def.regex.as_deref())
                .bind(def.min)
                .bind(def.max)
                .bind(&input.status)
                .bind(now)
                .bind(id)
                .bind(template_id)
                .execute(pool)
            })
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: &str, template_id: &str) -> Result<u64, DatabaseError> {
        let pool = self.db.pool();
        let result = self
            .db
            .with_retry(|| {
                sqlx::query("DELETE FROM template_fields WHERE id = ? AND template_id = ?")
                    .bind(id)
                    .bind(template_id)
                    .execute(pool)
            })
            .await?;
        Ok(result.rows_affected())
    }
}
