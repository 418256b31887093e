pub mod cases;
pub mod roles;
pub mod template_config;
pub mod template_fields;
pub mod templates;

pub use cases::{CaseRepository, NewCase};
pub use roles::RoleRepository;
pub use template_config::TemplateConfigRepository;
pub use template_fields::TemplateFieldRepository;
pub use templates::TemplateRepository;
