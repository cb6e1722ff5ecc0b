//! API layer - HTTP endpoint handlers organized by domain.

mod health;
mod logs;
mod metrics;
mod routes;
mod send;
mod templates;
mod triggers;

pub use health::health;
pub use logs::{get_send_log, list_send_logs};
pub use metrics::prometheus_metrics;
pub use routes::{api_routes, public_routes};
pub use send::{send_email, send_email_async, AttachmentRequest, SendRequest, SuccessResponse};
pub use templates::{
    create_template, delete_template, get_template, list_templates, preview_template,
    test_send_template, update_template, TestSendRequest,
};
pub use triggers::{get_trigger, get_trigger_params, list_triggers};
