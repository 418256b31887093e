// Case data validation against a template's field definitions
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::field::{FieldDefinition, FieldType};
use super::template_config::LayoutItem;
use super::ValidationError;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static tag pattern"));

/// Validate a submitted case payload.
///
/// Fields are visited in layout order when a non-empty layout is given
/// (codes without a definition are skipped), otherwise in definition order.
/// The first violation is returned; nothing is aggregated.
pub fn validate_case_data(
    fields: &[FieldDefinition],
    layout: Option<&[LayoutItem]>,
    data: &Value,
) -> Result<(), ValidationError> {
    let data = data
        .as_object()
        .ok_or_else(|| ValidationError::new("data_json must be object"))?;

    for field in select_fields(fields, layout) {
        validate_field(field, data)?;
    }
    Ok(())
}

fn select_fields<'a>(
    fields: &'a [FieldDefinition],
    layout: Option<&[LayoutItem]>,
) -> Vec<&'a FieldDefinition> {
    match layout {
        Some(items) if !items.is_empty() => {
            let by_code: HashMap<&str, &FieldDefinition> =
                fields.iter().map(|f| (f.field_code.as_str(), f)).collect();
            items
                .iter()
                .filter_map(|item| by_code.get(item.field_code.as_str()).copied())
                .collect()
        }
        _ => fields.iter().collect(),
    }
}

fn validate_field(field: &FieldDefinition, data: &Map<String, Value>) -> Result<(), ValidationError> {
    if field.field_type.is_layout_only() {
        return Ok(());
    }

    let value = data.get(&field.field_code);
    // List types reject scalars before the emptiness rule can treat them as blank
    if let Some(v) = value {
        if field.field_type.is_multi_valued() && !v.is_null() && !v.is_array() {
            return Err(field_error(field, "must be array"));
        }
    }
    let value = match value {
        Some(v) if !is_empty(v, &field.field_type) => v,
        _ if field.required => return Err(field_error(field, "required")),
        _ => return Ok(()),
    };

    match field.field_type {
        FieldType::Number => return validate_number(field, value),
        FieldType::Table => validate_table(field, value)?,
        FieldType::Richtext if strip_html(value).is_empty() => {
            return Err(field_error(field, "required"));
        }
        _ => {}
    }

    if let Some(pattern) = field.regex.as_deref().filter(|p| !p.is_empty()) {
        let matched = Regex::new(pattern)
            .map(|re| re.is_match(&display_value(value)))
            .unwrap_or(false);
        if !matched {
            return Err(field_error(field, "invalid"));
        }
    }

    Ok(())
}

/// Number fields stop after the bounds check; a configured regex is never consulted.
fn validate_number(field: &FieldDefinition, value: &Value) -> Result<(), ValidationError> {
    let num = parse_number(value).ok_or_else(|| field_error(field, "must be number"))?;
    if let Some(min) = field.min {
        if num < min {
            return Err(field_error(field, &format!("min {}", min)));
        }
    }
    if let Some(max) = field.max {
        if num > max {
            return Err(field_error(field, &format!("max {}", max)));
        }
    }
    Ok(())
}

fn validate_table(field: &FieldDefinition, value: &Value) -> Result<(), ValidationError> {
    let rows = value.as_array().ok_or_else(|| field_error(field, "must be array"))?;
    let opts = field.table_options();
    let count = rows.len() as u64;

    if count < opts.min_rows {
        return Err(field_error(field, &format!("at least {} rows", opts.min_rows)));
    }
    if count > opts.max_rows {
        return Err(field_error(field, &format!("max {} rows", opts.max_rows)));
    }

    for (index, row) in rows.iter().enumerate() {
        let row = row
            .as_object()
            .ok_or_else(|| field_error(field, &format!("row {} invalid", index + 1)))?;

        for col in opts.columns.iter().filter(|c| c.required) {
            let blank = match row.get(&col.code) {
                None | Some(Value::Null) => true,
                Some(cell) => display_value(cell).trim().is_empty(),
            };
            if blank {
                return Err(field_error(field, &format!("column {} required", col.name)));
            }
        }
    }
    Ok(())
}

fn field_error(field: &FieldDefinition, rule: &str) -> ValidationError {
    ValidationError::new(format!("{} {}", field.field_name, rule))
}

pub(crate) fn is_empty(value: &Value, field_type: &FieldType) -> bool {
    if value.is_null() {
        return true;
    }
    if field_type.is_multi_valued() {
        return value.as_array().map(Vec::is_empty).unwrap_or(true);
    }
    if *field_type == FieldType::Richtext {
        return strip_html(value).is_empty();
    }
    match value {
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Text content of a rich-text value: tags removed, whitespace trimmed.
/// Falsy scalars (`false`, `0`, `""`) count as no content.
pub(crate) fn strip_html(value: &Value) -> String {
    let text = match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        other => display_value(other),
    };
    HTML_TAG.replace_all(&text, "").trim().to_string()
}

/// Explicit numeric coercion: JSON numbers as-is, strings trimmed and parsed.
/// Non-finite results are rejected.
pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    let num = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    num.is_finite().then_some(num)
}

/// Flat string form of a value, used for regex and blank-cell checks.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()).unwrap_or_default(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layout(codes: &[&str]) -> Vec<LayoutItem> {
        codes.iter().map(|c| LayoutItem::new(*c)).collect()
    }

    fn message(result: Result<(), ValidationError>) -> String {
        result.expect_err("expected validation failure").to_string()
    }

    fn table_field() -> FieldDefinition {
        FieldDefinition::new("items", "Items", FieldType::Table).with_options(json!({
            "minRows": 1,
            "maxRows": 3,
            "columns": [
                { "code": "sku", "name": "SKU", "required": true },
                { "code": "note", "name": "Note" }
            ]
        }))
    }

    #[test]
    fn accepts_complete_record() {
        let fields = vec![
            FieldDefinition::new("title", "Title", FieldType::Text).required(),
            FieldDefinition::new("qty", "Quantity", FieldType::Number)
                .required()
                .with_bounds(Some(1.0), Some(10.0)),
            FieldDefinition::new("tags", "Tags", FieldType::Checkbox),
            FieldDefinition::new("zip", "Zip", FieldType::Text).with_regex("^[0-9]+$"),
            table_field(),
            FieldDefinition::new("body", "Body", FieldType::Richtext).required(),
        ];
        let data = json!({
            "title": "Broken pump",
            "qty": "4",
            "tags": ["a"],
            "zip": "123",
            "items": [{ "sku": "X-1" }],
            "body": "<p>hello</p>"
        });
        assert!(validate_case_data(&fields, None, &data).is_ok());
    }

    #[test]
    fn rejects_non_object_data_before_fields() {
        let fields = vec![FieldDefinition::new("title", "Title", FieldType::Text).required()];
        assert_eq!(message(validate_case_data(&fields, None, &json!([]))), "data_json must be object");
        assert_eq!(message(validate_case_data(&fields, None, &json!("x"))), "data_json must be object");
        assert_eq!(message(validate_case_data(&[], None, &json!(null))), "data_json must be object");
    }

    #[test]
    fn missing_required_field_names_the_field() {
        let fields = vec![FieldDefinition::new("title", "Title", FieldType::Text).required()];
        assert_eq!(message(validate_case_data(&fields, None, &json!({}))), "Title required");
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "title": "   " }))), "Title required");
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "title": null }))), "Title required");
    }

    #[test]
    fn optional_empty_values_skip_further_checks() {
        let fields = vec![
            FieldDefinition::new("zip", "Zip", FieldType::Text).with_regex("^[0-9]+$"),
            FieldDefinition::new("qty", "Quantity", FieldType::Number).with_bounds(Some(5.0), None),
        ];
        assert!(validate_case_data(&fields, None, &json!({ "zip": "", "qty": " " })).is_ok());
    }

    #[test]
    fn number_coercion_and_bounds() {
        let fields = vec![FieldDefinition::new("qty", "Quantity", FieldType::Number)
            .with_bounds(Some(1.0), Some(10.5))];
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "qty": "abc" }))), "Quantity must be number");
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "qty": 0 }))), "Quantity min 1");
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "qty": "11" }))), "Quantity max 10.5");
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "qty": true }))), "Quantity must be number");
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "qty": "inf" }))), "Quantity must be number");
        assert!(validate_case_data(&fields, None, &json!({ "qty": " 7 " })).is_ok());
    }

    #[test]
    fn number_fields_skip_regex() {
        // A regex on a number field is never evaluated.
        let fields = vec![FieldDefinition::new("code", "Code", FieldType::Number).with_regex(r"^\d{5}$")];
        assert!(validate_case_data(&fields, None, &json!({ "code": 12 })).is_ok());
    }

    #[test]
    fn checkbox_requires_array() {
        let fields = vec![FieldDefinition::new("tags", "Tags", FieldType::Checkbox)];
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "tags": "a" }))), "Tags must be array");

        let required = vec![FieldDefinition::new("tags", "Tags", FieldType::SelectMulti).required()];
        assert_eq!(message(validate_case_data(&required, None, &json!({ "tags": [] }))), "Tags required");
        assert_eq!(message(validate_case_data(&required, None, &json!({ "tags": "a" }))), "Tags must be array");
        assert_eq!(message(validate_case_data(&required, None, &json!({ "tags": null }))), "Tags required");
        assert!(validate_case_data(&fields, None, &json!({ "tags": null })).is_ok());
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "tags": { "a": 1 } }))), "Tags must be array");
    }

    #[test]
    fn table_requires_array() {
        let fields = vec![table_field()];
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "items": "x" }))), "Items must be array");
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "items": 3 }))), "Items must be array");
    }

    #[test]
    fn table_row_count_limits() {
        let fields = vec![table_field()];
        let empty_but_present = json!({ "items": [] });
        // Empty table with no required flag is simply absent.
        assert!(validate_case_data(&fields, None, &empty_but_present).is_ok());

        let too_many = json!({ "items": [{"sku": "a"}, {"sku": "b"}, {"sku": "c"}, {"sku": "d"}] });
        assert_eq!(message(validate_case_data(&fields, None, &too_many)), "Items max 3 rows");

        let strict = vec![FieldDefinition::new("items", "Items", FieldType::Table)
            .with_options(json!({ "minRows": 2 }))];
        assert_eq!(
            message(validate_case_data(&strict, None, &json!({ "items": [{}] }))),
            "Items at least 2 rows"
        );
    }

    #[test]
    fn table_rows_and_required_columns() {
        let fields = vec![table_field()];
        assert_eq!(
            message(validate_case_data(&fields, None, &json!({ "items": [{"sku": "a"}, "oops"] }))),
            "Items row 2 invalid"
        );
        assert_eq!(
            message(validate_case_data(&fields, None, &json!({ "items": [{"note": "n"}] }))),
            "Items column SKU required"
        );
        assert_eq!(
            message(validate_case_data(&fields, None, &json!({ "items": [{"sku": "  "}] }))),
            "Items column SKU required"
        );
        assert!(validate_case_data(&fields, None, &json!({ "items": [{"sku": 0}] })).is_ok());
    }

    #[test]
    fn richtext_markup_only_counts_as_blank() {
        let fields = vec![FieldDefinition::new("body", "Body", FieldType::Richtext).required()];
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "body": "<p></p>" }))), "Body required");
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "body": "<p> <br/> </p>" }))), "Body required");
        assert!(validate_case_data(&fields, None, &json!({ "body": "<b>ok</b>" })).is_ok());

        let optional = vec![FieldDefinition::new("body", "Body", FieldType::Richtext)];
        assert!(validate_case_data(&optional, None, &json!({ "body": "<p></p>" })).is_ok());
    }

    #[test]
    fn regex_applies_to_stringified_value() {
        let fields = vec![FieldDefinition::new("zip", "Zip", FieldType::Text).with_regex("^[0-9]+$")];
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "zip": "12a" }))), "Zip invalid");
        assert!(validate_case_data(&fields, None, &json!({ "zip": "123" })).is_ok());
        assert!(validate_case_data(&fields, None, &json!({ "zip": 123 })).is_ok());
    }

    #[test]
    fn uncompilable_regex_reports_invalid() {
        let fields = vec![FieldDefinition::new("zip", "Zip", FieldType::Text).with_regex("([")];
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "zip": "1" }))), "Zip invalid");
    }

    #[test]
    fn layout_restricts_and_orders_fields() {
        let fields = vec![
            FieldDefinition::new("a", "A", FieldType::Text).required(),
            FieldDefinition::new("b", "B", FieldType::Text).required(),
            FieldDefinition::new("c", "C", FieldType::Text).required(),
        ];
        let only_c = layout(&["c", "ghost"]);
        assert!(validate_case_data(&fields, Some(only_c.as_slice()), &json!({ "c": "x" })).is_ok());

        let reversed = layout(&["c", "b", "a"]);
        assert_eq!(message(validate_case_data(&fields, Some(reversed.as_slice()), &json!({}))), "C required");
    }

    #[test]
    fn empty_layout_validates_everything() {
        let fields = vec![FieldDefinition::new("a", "A", FieldType::Text).required()];
        let empty = layout(&[]);
        assert_eq!(message(validate_case_data(&fields, Some(empty.as_slice()), &json!({}))), "A required");
    }

    #[test]
    fn layout_only_types_are_ignored() {
        let fields = vec![
            FieldDefinition::new("sep", "Separator", FieldType::Divider).required(),
            FieldDefinition::new("grp", "Group", FieldType::Section).required(),
            FieldDefinition::new("more", "More", FieldType::Collapse).required(),
        ];
        assert!(validate_case_data(&fields, None, &json!({})).is_ok());
    }

    #[test]
    fn first_violation_wins() {
        let fields = vec![
            FieldDefinition::new("a", "A", FieldType::Text).required(),
            FieldDefinition::new("b", "B", FieldType::Number),
        ];
        assert_eq!(message(validate_case_data(&fields, None, &json!({ "b": "x" }))), "A required");
    }

    #[test]
    fn non_string_scalars_are_never_empty() {
        let fields = vec![
            FieldDefinition::new("flag", "Flag", FieldType::Switch).required(),
            FieldDefinition::new("n", "N", FieldType::Text).required(),
        ];
        assert!(validate_case_data(&fields, None, &json!({ "flag": false, "n": 0 })).is_ok());
    }

    #[test]
    fn display_value_matches_form_semantics() {
        assert_eq!(display_value(&json!(1.0)), "1");
        assert_eq!(display_value(&json!(2.5)), "2.5");
        assert_eq!(display_value(&json!(["a", 1])), "a,1");
        assert_eq!(display_value(&json!({"k": 1})), "[object Object]");
    }
}
