use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::validation::{FieldDefinition, FieldType};

/// `template_fields` row as stored; JSON columns are still text here.
#[derive(Debug, Clone, FromRow)]
pub struct TemplateFieldRow {
    pub id: String,
    pub template_id: String,
    pub field_code: String,
    pub field_name: String,
    pub field_type: String,
    pub required: bool,
    pub default_value: Option<String>,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub options_json: Option<String>,
    pub regex: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A template field as the API presents it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateField {
    pub id: String,
    pub template_id: String,
    #[serde(flatten)]
    pub definition: FieldDefinition,
    pub default_value: Option<Value>,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TemplateFieldRow> for TemplateField {
    fn from(row: TemplateFieldRow) -> Self {
        let definition = FieldDefinition {
            field_code: row.field_code,
            field_name: row.field_name,
            field_type: FieldType::from(row.field_type),
            required: row.required,
            options: row.options_json.as_deref().and_then(parse_json),
            regex: row.regex.filter(|r| !r.is_empty()),
            min: row.min,
            max: row.max,
        };
        Self {
            id: row.id,
            template_id: row.template_id,
            definition,
            // Values written before JSON encoding was introduced are kept as strings
            default_value: row
                .default_value
                .map(|raw| parse_json(&raw).unwrap_or(Value::String(raw))),
            placeholder: row.placeholder,
            help_text: row.help_text,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Writable part of a template field, shared by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFieldInput {
    pub definition: FieldDefinition,
    pub default_value: Option<Value>,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub status: String,
}

impl TemplateFieldInput {
    pub fn options_json(&self) -> Option<String> {
        encode_json(self.definition.options.as_ref())
    }

    pub fn default_value_json(&self) -> Option<String> {
        encode_json(self.default_value.as_ref())
    }
}

fn parse_json(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok().filter(|v: &Value| !v.is_null())
}

fn encode_json(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.to_string()),
    }
}
