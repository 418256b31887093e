pub mod case_data;
pub mod field;
pub mod input;
pub mod template_config;

pub use case_data::validate_case_data;
pub use field::{FieldDefinition, FieldType, TableColumn, TableOptions};
pub use template_config::{validate_template_config, LayoutItem, TemplateConfig};

use thiserror::Error;

/// A single rule violation, worded for the person filling in the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
