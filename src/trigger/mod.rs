//! Trigger catalog.
//!
//! A trigger is an application event (for example `user:registered`) that
//! may cause an email to be sent. Each trigger declares the parameters its
//! templates can reference; a separate list of common parameters is shared by
//! every trigger.

mod registry;
mod types;

pub use registry::TriggerRegistry;
pub use types::{Param, ParamType, TriggerDefinition};
