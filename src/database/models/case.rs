use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use super::TemplateField;
use crate::validation::TemplateConfig;

/// A case joined with its template name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub id: String,
    pub case_no: String,
    pub template_id: String,
    pub template_name: String,
    pub title: String,
    pub status: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub is_deleted: bool,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub id: String,
    pub name: String,
}

/// Everything an editor needs to render and edit one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseDetail {
    pub case: CaseRecord,
    pub template: TemplateRef,
    pub config_json: Option<TemplateConfig>,
    pub fields: Vec<TemplateField>,
    pub data_json: Value,
}

/// Query string filters for the case list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseFilters {
    pub template_id: Option<String>,
    pub keyword: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub include_deleted: Option<String>,
}

impl CaseFilters {
    pub fn include_deleted(&self) -> bool {
        matches!(self.include_deleted.as_deref(), Some("1") | Some("true"))
    }

    /// Blank query values are treated as absent.
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            template_id: clean(self.template_id),
            keyword: clean(self.keyword),
            from: clean(self.from),
            to: clean(self.to),
            include_deleted: self.include_deleted,
        }
    }
}
