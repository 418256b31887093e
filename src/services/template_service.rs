use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use tracing::info;

use super::{conflict_on_unique, ServiceError, ServiceResult};
use crate::database::models::{Template, TemplateField, TemplateFieldInput};
use crate::database::repository::{TemplateConfigRepository, TemplateFieldRepository, TemplateRepository};
use crate::database::{DatabaseError, DatabaseManager};
use crate::types::{new_id, now_iso};
use crate::validation::{validate_template_config, TemplateConfig};

/// Templates, their field schema and their layout document.
#[derive(Clone)]
pub struct TemplateService {
    templates: TemplateRepository,
    fields: TemplateFieldRepository,
    configs: TemplateConfigRepository,
}

impl TemplateService {
    pub fn new(db: DatabaseManager) -> Self {
        Self {
            templates: TemplateRepository::new(db.clone()),
            fields: TemplateFieldRepository::new(db.clone()),
            configs: TemplateConfigRepository::new(db),
        }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Template>> {
        Ok(self.templates.list().await?)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Template> {
        self.templates
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("template not found".to_string()))
    }

    pub async fn create(&self, name: &str, description: Option<String>) -> ServiceResult<Template> {
        let template = Template {
            id: new_id(),
            name: name.to_string(),
            description,
            created_at: now_iso(),
        };
        self.templates
            .insert(&template)
            .await
            .map_err(|e| conflict_on_unique(e, name))?;

        info!("Created template {} ({})", template.name, template.id);
        Ok(template)
    }

    pub async fn update(&self, id: &str, name: &str, description: Option<&str>) -> ServiceResult<()> {
        let changed = self
            .templates
            .update(id, name, description)
            .await
            .map_err(|e| conflict_on_unique(e, name))?;
        if changed == 0 {
            return Err(ServiceError::not_found());
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        // SQLite reports RESTRICT as a generic constraint error, so check first
        if self.templates.count_cases(id).await? > 0 {
            return Err(ServiceError::Conflict("template has cases".to_string()));
        }
        let deleted = self.templates.delete(id).await.map_err(|e| {
            if e.is_foreign_key_violation() {
                ServiceError::Conflict("template has cases".to_string())
            } else {
                ServiceError::Database(e)
            }
        })?;
        if deleted == 0 {
            return Err(ServiceError::not_found());
        }
        info!("Deleted template {}", id);
        Ok(())
    }

    pub async fn list_fields(&self, template_id: &str) -> ServiceResult<Vec<TemplateField>> {
        self.get(template_id).await?;
        Ok(self.fields.list(template_id).await?)
    }

    pub async fn create_field(&self, template_id: &str, input: &TemplateFieldInput) -> ServiceResult<TemplateField> {
        check_field(input)?;
        self.get(template_id).await?;

        let id = new_id();
        self.fields
            .insert(&id, template_id, input, &now_iso())
            .await
            .map_err(|e| field_conflict(e, input))?;

        self.fields.get(template_id, &id).await?.ok_or_else(ServiceError::not_found)
    }

    pub async fn update_field(
        &self,
        template_id: &str,
        field_id: &str,
        input: &TemplateFieldInput,
    ) -> ServiceResult<TemplateField> {
        check_field(input)?;
        let changed = self
            .fields
            .update(field_id, template_id, input, &now_iso())
            .await
            .map_err(|e| field_conflict(e, input))?;
        if changed == 0 {
            return Err(ServiceError::not_found());
        }

        self.fields
            .get(template_id, field_id)
            .await?
            .ok_or_else(ServiceError::not_found)
    }

    pub async fn delete_field(&self, template_id: &str, field_id: &str) -> ServiceResult<()> {
        if self.fields.delete(field_id, template_id).await? == 0 {
            return Err(ServiceError::not_found());
        }
        Ok(())
    }

    /// Stored layout, or an empty version-1 document when none was saved.
    pub async fn get_config(&self, template_id: &str) -> ServiceResult<TemplateConfig> {
        self.get(template_id).await?;
        let raw = self.configs.get(template_id).await?;
        Ok(TemplateConfig::from_stored(raw.as_deref()).unwrap_or_default())
    }

    /// The layout may only reference fields the template currently has.
    pub async fn replace_config(&self, template_id: &str, value: &Value) -> ServiceResult<TemplateConfig> {
        self.get(template_id).await?;
        let codes: HashSet<String> = self
            .fields
            .list(template_id)
            .await?
            .into_iter()
            .map(|f| f.definition.field_code)
            .collect();

        let config = validate_template_config(value, &codes)?;
        let json = serde_json::to_string(&config)
            .map_err(|e| ServiceError::validation(format!("template_config_json invalid: {}", e)))?;
        self.configs.upsert(template_id, &json, &now_iso()).await?;

        info!("Replaced layout of template {} ({} items)", template_id, config.layout.len());
        Ok(config)
    }
}

/// Definition-level rules a field must satisfy before it is stored.
fn check_field(input: &TemplateFieldInput) -> ServiceResult<()> {
    let def = &input.definition;
    if !def.field_type.is_known() {
        return Err(ServiceError::validation(format!("fieldType {} not supported", def.field_type)));
    }
    if let Some(pattern) = &def.regex {
        Regex::new(pattern).map_err(|_| ServiceError::validation("regex invalid"))?;
    }
    if let (Some(min), Some(max)) = (def.min, def.max) {
        if min > max {
            return Err(ServiceError::validation("min must be <= max"));
        }
    }
    Ok(())
}

fn field_conflict(err: DatabaseError, input: &TemplateFieldInput) -> ServiceError {
    conflict_on_unique(err, &input.definition.field_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::test_db;
    use crate::validation::{FieldDefinition, FieldType};
    use serde_json::json;

    fn input(def: FieldDefinition) -> TemplateFieldInput {
        TemplateFieldInput {
            definition: def,
            default_value: None,
            placeholder: None,
            help_text: None,
            status: "active".to_string(),
        }
    }

    #[test]
    fn rejects_bad_definitions() {
        let unknown = input(FieldDefinition::new("a", "A", FieldType::from("color")));
        assert_eq!(check_field(&unknown).unwrap_err().to_string(), "fieldType color not supported");

        let regex = input(FieldDefinition::new("a", "A", FieldType::Text).with_regex("(["));
        assert_eq!(check_field(&regex).unwrap_err().to_string(), "regex invalid");

        let bounds = input(FieldDefinition::new("a", "A", FieldType::Number).with_bounds(Some(5.0), Some(1.0)));
        assert_eq!(check_field(&bounds).unwrap_err().to_string(), "min must be <= max");

        let ok = input(FieldDefinition::new("a", "A", FieldType::Number).with_bounds(Some(1.0), Some(1.0)));
        assert!(check_field(&ok).is_ok());
    }

    #[tokio::test]
    async fn field_codes_are_unique_per_template() {
        let (_dir, db) = test_db().await;
        let service = TemplateService::new(db);
        let a = service.create("Intake", None).await.unwrap();
        let b = service.create("Followup", None).await.unwrap();
        let field = input(FieldDefinition::new("title", "Title", FieldType::Text).required());

        service.create_field(&a.id, &field).await.unwrap();
        service.create_field(&b.id, &field).await.unwrap();
        let err = service.create_field(&a.id, &field).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref msg) if msg == "title already exists"));
    }

    #[tokio::test]
    async fn fields_round_trip_through_storage() {
        let (_dir, db) = test_db().await;
        let service = TemplateService::new(db);
        let t = service.create("Intake", Some("first contact".into())).await.unwrap();

        let mut table = input(
            FieldDefinition::new("items", "Items", FieldType::Table)
                .with_options(json!({ "minRows": 1, "columns": [{ "code": "sku", "required": true }] })),
        );
        table.default_value = Some(json!([]));
        let created = service.create_field(&t.id, &table).await.unwrap();
        assert_eq!(created.definition.field_type, FieldType::Table);
        assert_eq!(created.default_value, Some(json!([])));

        table.definition.field_name = "Line items".into();
        let updated = service.update_field(&t.id, &created.id, &table).await.unwrap();
        assert_eq!(updated.definition.field_name, "Line items");

        let fields = service.list_fields(&t.id).await.unwrap();
        assert_eq!(fields.len(), 1);

        service.delete_field(&t.id, &created.id).await.unwrap();
        assert!(matches!(
            service.delete_field(&t.id, &created.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn config_is_checked_against_current_fields() {
        let (_dir, db) = test_db().await;
        let service = TemplateService::new(db);
        let t = service.create("Intake", None).await.unwrap();
        service
            .create_field(&t.id, &input(FieldDefinition::new("title", "Title", FieldType::Text)))
            .await
            .unwrap();

        assert_eq!(service.get_config(&t.id).await.unwrap(), TemplateConfig::default());

        let err = service
            .replace_config(&t.id, &json!({ "version": 1, "layout": [{ "fieldCode": "ghost" }] }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "layout[0].fieldCode not found");

        let saved = service
            .replace_config(&t.id, &json!({ "version": 1, "layout": [{ "fieldCode": "title", "span": 12 }] }))
            .await
            .unwrap();
        assert_eq!(saved.layout[0].span, 12);
        assert!(saved.layout[0].visible);
        assert_eq!(service.get_config(&t.id).await.unwrap(), saved);
    }

    #[tokio::test]
    async fn missing_template_is_not_found() {
        let (_dir, db) = test_db().await;
        let service = TemplateService::new(db);
        assert!(matches!(service.list_fields("nope").await.unwrap_err(), ServiceError::NotFound(_)));
        assert!(matches!(service.get_config("nope").await.unwrap_err(), ServiceError::NotFound(_)));
        assert!(matches!(service.delete("nope").await.unwrap_err(), ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn template_with_cases_is_kept() {
        let (_dir, db) = test_db().await;
        let service = TemplateService::new(db.clone());
        let cases = crate::services::CaseService::new(db);
        let template = service.create("Intake", None).await.unwrap();
        let case = cases.create(&template.id, "First", serde_json::Map::new()).await.unwrap();

        let err = service.delete(&template.id).await.unwrap_err();
        assert!(matches!(&err, ServiceError::Conflict(m) if m == "template has cases"));

        cases.delete(&case.id, "admin").await.unwrap();
        let err = service.delete(&template.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let empty = service.create("Empty", None).await.unwrap();
        service.delete(&empty.id).await.unwrap();
    }
}
