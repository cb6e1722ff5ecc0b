//! Transactional email notifications driven by application triggers.
//!
//! A trigger (e.g. `user:registered`) selects a language-specific template,
//! which is rendered with merged parameters, delivered through a
//! [`transport::MailTransport`] and recorded in a send log.

// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod pagination;
pub mod postgres;
pub mod telemetry;

// Domain
pub mod send_log;
pub mod service;
pub mod template;
pub mod transport;
pub mod trigger;

// Application layer
pub mod api;
pub mod server;

pub use error::{ErrorKind, NotificationError, Result};
pub use service::{EmailNotificationService, SendInput};
