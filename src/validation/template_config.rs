use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::ValidationError;

pub const CONFIG_VERSION: u64 = 1;
pub const MIN_SPAN: i64 = 1;
pub const MAX_SPAN: i64 = 24;

/// Versioned layout document attached to a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub version: u64,
    pub layout: Vec<LayoutItem>,
}

/// One entry of a template layout: which field, and how to show it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItem {
    pub field_code: String,
    #[serde(default = "default_span")]
    pub span: i64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub readonly: bool,
}

fn default_span() -> i64 {
    MAX_SPAN
}

fn default_true() -> bool {
    true
}

impl LayoutItem {
    pub fn new(field_code: impl Into<String>) -> Self {
        Self {
            field_code: field_code.into(),
            span: MAX_SPAN,
            label: None,
            placeholder: None,
            visible: true,
            readonly: false,
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            layout: Vec::new(),
        }
    }
}

impl TemplateConfig {
    /// Decode a stored document. Anything unreadable is treated as "no layout".
    pub fn from_stored(raw: Option<&str>) -> Option<Self> {
        let raw = raw.filter(|s| !s.is_empty())?;
        match serde_json::from_str(raw) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Ignoring unreadable template config: {}", e);
                None
            }
        }
    }
}

/// Check a submitted layout document against the template's field codes and
/// return its normalized form.
pub fn validate_template_config(
    value: &Value,
    field_codes: &HashSet<String>,
) -> Result<TemplateConfig, ValidationError> {
    let config = value
        .as_object()
        .ok_or_else(|| ValidationError::new("template_config_json must be object"))?;

    if config.get("version").and_then(Value::as_u64) != Some(CONFIG_VERSION) {
        return Err(ValidationError::new("template_config_json.version must be 1"));
    }

    let items = config
        .get("layout")
        .and_then(Value::as_array)
        .ok_or_else(|| ValidationError::new("template_config_json.layout must be array"))?;

    let mut seen = HashSet::new();
    let mut layout = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let item = item
            .as_object()
            .ok_or_else(|| ValidationError::new(format!("layout[{}] must be object", index)))?;

        let field_code = item
            .get("fieldCode")
            .and_then(Value::as_str)
            .filter(|code| !code.is_empty())
            .ok_or_else(|| ValidationError::new(format!("layout[{}].fieldCode required", index)))?;
        if !field_codes.contains(field_code) {
            return Err(ValidationError::new(format!("layout[{}].fieldCode not found", index)));
        }
        if !seen.insert(field_code.to_string()) {
            return Err(ValidationError::new(format!("layout[{}].fieldCode duplicated", index)));
        }

        let span = item
            .get("span")
            .and_then(Value::as_i64)
            .filter(|span| (MIN_SPAN..=MAX_SPAN).contains(span))
            .ok_or_else(|| ValidationError::new(format!("layout[{}].span must be 1-24", index)))?;

        layout.push(LayoutItem {
            field_code: field_code.to_string(),
            span,
            label: optional_text(item, "label"),
            placeholder: optional_text(item, "placeholder"),
            visible: item.get("visible").and_then(Value::as_bool).unwrap_or(true),
            readonly: item.get("readonly").and_then(Value::as_bool).unwrap_or(false),
        });
    }

    Ok(TemplateConfig {
        version: CONFIG_VERSION,
        layout,
    })
}

fn optional_text(item: &Map<String, Value>, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
