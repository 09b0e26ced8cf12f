pub mod extraction;
pub mod matcher;
pub mod oov;
pub mod template;

pub use matcher::{assign_templates, match_template};
pub use template::{CompiledTemplate, Template, TemplateField, TemplateLibrary};
