//! Email templates.
//!
//! This module provides:
//! - The template entity and its create/update/filter inputs
//! - A renderer for `{{.Name}}` placeholders with a preview mode
//! - Storage behind [`TemplateRepository`], in memory or in PostgreSQL
//!
//! # Example
//!
//! ```ignore
//! let engine = TemplateEngine::new();
//! let mut params = Params::new();
//! params.insert("UserName".into(), json!("Alice"));
//!
//! let subject = engine.render("Welcome {{.UserName}}", &params)?;
//! assert_eq!(subject, "Welcome Alice");
//! ```

pub mod engine;
pub mod postgres;
pub mod store;
pub mod types;

pub use engine::{example_params, Params, RenderError, TemplateEngine};
pub use postgres::PgTemplateRepository;
pub use store::{InMemoryTemplateRepository, TemplateRepository};
pub use types::{
    CreateTemplateInput, NewTemplate, PreviewResult, Template, TemplateFilter, TemplateStatus,
    UpdateTemplateInput,
};
