pub mod case;
pub mod role;
pub mod template;
pub mod template_field;

pub use case::{CaseDetail, CaseFilters, CaseRecord, TemplateRef};
pub use role::Role;
pub use template::Template;
pub use template_field::{TemplateField, TemplateFieldInput, TemplateFieldRow};
