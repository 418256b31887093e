use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{ServiceError, ServiceResult};
use crate::database::models::{CaseDetail, CaseFilters, CaseRecord, TemplateField, TemplateRef};
use crate::database::repository::{
    CaseRepository, NewCase, TemplateConfigRepository, TemplateFieldRepository, TemplateRepository,
};
use crate::database::DatabaseManager;
use crate::middleware::auth::ADMIN_ROLE;
use crate::types::{new_id, now_iso};
use crate::validation::{validate_case_data, FieldDefinition, TemplateConfig};

/// Changes to an existing case, already shape-checked by the handler.
#[derive(Debug, Clone)]
pub struct CaseUpdate {
    pub title: String,
    pub status: Option<String>,
    pub data: Value,
}

#[derive(Clone)]
pub struct CaseService {
    cases: CaseRepository,
    templates: TemplateRepository,
    fields: TemplateFieldRepository,
    configs: TemplateConfigRepository,
}

impl CaseService {
    pub fn new(db: DatabaseManager) -> Self {
        Self {
            cases: CaseRepository::new(db.clone()),
            templates: TemplateRepository::new(db.clone()),
            fields: TemplateFieldRepository::new(db.clone()),
            configs: TemplateConfigRepository::new(db),
        }
    }

    pub async fn list(&self, filters: &CaseFilters) -> ServiceResult<Vec<CaseRecord>> {
        Ok(self.cases.list(filters).await?)
    }

    /// Values are validated against the template before anything is written.
    pub async fn create(&self, template_id: &str, title: &str, values: Map<String, Value>) -> ServiceResult<CaseRecord> {
        if self.templates.get(template_id).await?.is_none() {
            return Err(ServiceError::NotFound("template not found".to_string()));
        }
        let data = Value::Object(values);
        let (fields, config) = self.schema(template_id).await?;
        validate(&fields, config.as_ref(), &data)?;

        let id = new_id();
        let created_at = now_iso();
        let case_no = case_number(&id, &created_at);
        let data_id = new_id();
        let data_json = data.to_string();
        self.cases
            .create(&NewCase {
                id: &id,
                case_no: &case_no,
                template_id,
                title,
                status: None,
                created_at: &created_at,
                data_id: &data_id,
                data_json: &data_json,
            })
            .await?;

        info!("Created case {} ({})", case_no, id);
        self.cases.get(&id).await?.ok_or_else(ServiceError::not_found)
    }

    pub async fn detail(&self, id: &str) -> ServiceResult<CaseDetail> {
        let case = self.cases.get(id).await?.ok_or_else(ServiceError::not_found)?;
        let (fields, config_json) = self.schema(&case.template_id).await?;

        let data_json = match self.cases.get_data(id).await? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Case {} has unreadable data: {}", id, e);
                Value::Object(Map::new())
            }),
            None => Value::Object(Map::new()),
        };

        Ok(CaseDetail {
            template: TemplateRef {
                id: case.template_id.clone(),
                name: case.template_name.clone(),
            },
            case,
            config_json,
            fields,
            data_json,
        })
    }

    /// Validates against the template's current fields and layout, then
    /// writes case and data together.
    pub async fn update(&self, id: &str, update: &CaseUpdate) -> ServiceResult<CaseDetail> {
        let case = self.cases.get(id).await?.ok_or_else(ServiceError::not_found)?;
        let (fields, config) = self.schema(&case.template_id).await?;
        validate(&fields, config.as_ref(), &update.data)?;

        let changed = self
            .cases
            .update(
                id,
                &update.title,
                update.status.as_deref(),
                &update.data.to_string(),
                &now_iso(),
            )
            .await?;
        if changed == 0 {
            return Err(ServiceError::not_found());
        }
        self.detail(id).await
    }

    /// Soft delete; only admins may remove cases.
    pub async fn delete(&self, id: &str, role_code: &str) -> ServiceResult<()> {
        if role_code != ADMIN_ROLE {
            warn!("Role {} may not delete case {}", role_code, id);
            return Err(ServiceError::Forbidden("forbidden".to_string()));
        }
        if self.cases.soft_delete(id, &now_iso()).await? == 0 {
            return Err(ServiceError::not_found());
        }
        info!("Soft-deleted case {}", id);
        Ok(())
    }

    async fn schema(&self, template_id: &str) -> ServiceResult<(Vec<TemplateField>, Option<TemplateConfig>)> {
        let fields = self.fields.list(template_id).await?;
        let raw = self.configs.get(template_id).await?;
        Ok((fields, TemplateConfig::from_stored(raw.as_deref())))
    }
}

fn validate(fields: &[TemplateField], config: Option<&TemplateConfig>, data: &Value) -> ServiceResult<()> {
    let definitions: Vec<FieldDefinition> = fields.iter().map(|f| f.definition.clone()).collect();
    let layout = config.map(|c| c.layout.as_slice());
    validate_case_data(&definitions, layout, data)?;
    Ok(())
}

/// `C<yyyymmdd>-<first six hex digits of the id>`, e.g. `C20240131-3F2A9C`.
fn case_number(id: &str, created_at: &str) -> String {
    let date: String = created_at.chars().take(10).filter(char::is_ascii_digit).collect();
    let suffix: String = id
        .chars()
        .filter(char::is_ascii_hexdigit)
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("C{}-{}", date, suffix)
}
