use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Form field kinds a template can declare.
///
/// Stored as plain strings; `input` and `multiselect` are accepted as aliases
/// of `text` and `select_multi`. Anything unrecognized survives a round trip
/// as `Other` so legacy rows still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Date,
    Datetime,
    Select,
    SelectMulti,
    Radio,
    Checkbox,
    Switch,
    Divider,
    Section,
    Collapse,
    Richtext,
    Table,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Select => "select",
            FieldType::SelectMulti => "select_multi",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Switch => "switch",
            FieldType::Divider => "divider",
            FieldType::Section => "section",
            FieldType::Collapse => "collapse",
            FieldType::Richtext => "richtext",
            FieldType::Table => "table",
            FieldType::Other(raw) => raw,
        }
    }

    /// Layout-only types never carry a value.
    pub fn is_layout_only(&self) -> bool {
        matches!(self, FieldType::Divider | FieldType::Section | FieldType::Collapse)
    }

    /// Types whose value is a list.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, FieldType::Checkbox | FieldType::SelectMulti | FieldType::Table)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FieldType::Other(_))
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "text" | "input" => FieldType::Text,
            "textarea" => FieldType::Textarea,
            "number" => FieldType::Number,
            "date" => FieldType::Date,
            "datetime" => FieldType::Datetime,
            "select" => FieldType::Select,
            "select_multi" | "multiselect" => FieldType::SelectMulti,
            "radio" => FieldType::Radio,
            "checkbox" => FieldType::Checkbox,
            "switch" => FieldType::Switch,
            "divider" => FieldType::Divider,
            "section" => FieldType::Section,
            "collapse" => FieldType::Collapse,
            "richtext" => FieldType::Richtext,
            "table" => FieldType::Table,
            _ => FieldType::Other(raw),
        }
    }
}

impl From<&str> for FieldType {
    fn from(raw: &str) -> Self {
        FieldType::from(raw.to_string())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The validation-relevant part of a template field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub field_code: String,
    pub field_name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Choice list for select-like types, [`TableOptions`] for tables.
    #[serde(default)]
    pub options: Option<Value>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl FieldDefinition {
    pub fn new(code: impl Into<String>, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field_code: code.into(),
            field_name: name.into(),
            field_type,
            required: false,
            options: None,
            regex: None,
            min: None,
            max: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Options as a JSON value; string-encoded JSON is decoded, garbage is dropped.
    pub fn parsed_options(&self) -> Option<Value> {
        match self.options.as_ref()? {
            Value::Null => None,
            Value::String(raw) if raw.is_empty() => None,
            Value::String(raw) => serde_json::from_str(raw).ok(),
            other => Some(other.clone()),
        }
    }

    pub fn table_options(&self) -> TableOptions {
        self.parsed_options()
            .map(|value| TableOptions::from_value(&value))
            .unwrap_or_default()
    }
}

pub const DEFAULT_MIN_ROWS: u64 = 0;
pub const DEFAULT_MAX_ROWS: u64 = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    pub min_rows: u64,
    pub max_rows: u64,
    pub columns: Vec<TableColumn>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            min_rows: DEFAULT_MIN_ROWS,
            max_rows: DEFAULT_MAX_ROWS,
            columns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub code: String,
    pub name: String,
    pub required: bool,
}

impl TableOptions {
    /// Lenient read of `{minRows, maxRows, columns}`; malformed parts fall back to defaults.
    pub fn from_value(value: &Value) -> Self {
        let columns = value
            .get("columns")
            .and_then(Value::as_array)
            .map(|cols| cols.iter().filter_map(TableColumn::from_value).collect())
            .unwrap_or_default();

        Self {
            min_rows: row_bound(value.get("minRows"), f64::ceil).unwrap_or(DEFAULT_MIN_ROWS),
            max_rows: row_bound(value.get("maxRows"), f64::floor).unwrap_or(DEFAULT_MAX_ROWS),
            columns,
        }
    }
}

impl TableColumn {
    fn from_value(value: &Value) -> Option<Self> {
        let code = value.get("code")?.as_str()?.to_string();
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| code.clone());
        let required = value.get("required").map(truthy).unwrap_or(false);
        Some(Self { code, name, required })
    }
}

/// Non-negative row limit; fractional limits are rounded with `round`
/// so the comparison matches the raw bound.
fn row_bound(value: Option<&Value>, round: fn(f64) -> f64) -> Option<u64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then(|| round(n) as u64)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn aliases_map_to_canonical_types() {
        assert_eq!(FieldType::from("input"), FieldType::Text);
        assert_eq!(FieldType::from("multiselect"), FieldType::SelectMulti);
        assert_eq!(String::from(FieldType::SelectMulti), "select_multi");
    }

    #[test]
    fn unknown_type_round_trips() {
        let parsed: FieldType = serde_json::from_value(json!("signature")).unwrap();
        assert_eq!(parsed, FieldType::Other("signature".to_string()));
        assert!(!parsed.is_known());
        assert_eq!(serde_json::to_value(&parsed).unwrap(), json!("signature"));
    }

    #[test]
    fn table_options_defaults_and_string_payload() {
        let field = FieldDefinition::new("items", "Items", FieldType::Table)
            .with_options(json!(r#"{"minRows":1,"columns":[{"code":"sku","required":true}]}"#));
        let opts = field.table_options();
        assert_eq!(opts.min_rows, 1);
        assert_eq!(opts.max_rows, DEFAULT_MAX_ROWS);
        assert_eq!(opts.columns.len(), 1);
        assert_eq!(opts.columns[0].name, "sku");
        assert!(opts.columns[0].required);
    }

    #[test]
    fn fractional_row_bounds_round_inward() {
        let field = FieldDefinition::new("items", "Items", FieldType::Table)
            .with_options(json!({ "minRows": 1.5, "maxRows": "2.5" }));
        let opts = field.table_options();
        assert_eq!(opts.min_rows, 2);
        assert_eq!(opts.max_rows, 2);

        let negative = FieldDefinition::new("items", "Items", FieldType::Table)
            .with_options(json!({ "minRows": -1 }));
        assert_eq!(negative.table_options().min_rows, DEFAULT_MIN_ROWS);
    }

    #[test]
    fn garbage_options_fall_back_to_defaults() {
        let field = FieldDefinition::new("items", "Items", FieldType::Table)
            .with_options(json!("{not json"));
        assert_eq!(field.table_options(), TableOptions::default());
    }
}
