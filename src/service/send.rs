//! The send pipeline: resolve, merge, render, log, deliver, finalize.

use std::time::Instant;

use chrono::{Datelike, Local};
use serde_json::Value;

use super::{EmailNotificationService, SendInput};
use crate::error::{NotificationError, Result};
use crate::metrics::SendMetrics;
use crate::send_log::{NewSendLog, SendLog};
use crate::template::{example_params, Params, PreviewResult, RenderError, Template};
use crate::transport::{OutboundEmail, TransportError};

const CURRENT_YEAR: &str = "CurrentYear";

/// Subject and bodies after rendering.
struct RenderedEmail {
    subject: String,
    body_html: String,
    body_text: Option<String>,
}

impl EmailNotificationService {
    /// Send one email synchronously.
    ///
    /// Validation, template lookup and render failures return before any send log
    /// is written. Once the log exists it is finalized as `sent` or `failed`.
    #[tracing::instrument(
        skip(self, input),
        fields(trigger_code = %input.trigger_code, language = tracing::field::Empty)
    )]
    pub async fn send(&self, input: SendInput) -> Result<()> {
        let result = self.send_inner(&input).await;
        if let Err(ref err) = result {
            if !matches!(err, NotificationError::SendFailed(_)) {
                SendMetrics::record_rejected();
                tracing::warn!(error = %err, "Email send rejected");
            }
        }
        result
    }

    async fn send_inner(&self, input: &SendInput) -> Result<()> {
        if input.trigger_code.trim().is_empty() {
            return Err(NotificationError::InvalidInput(
                "trigger_code must not be empty".to_string(),
            ));
        }
        if input.recipient.trim().is_empty() {
            return Err(NotificationError::NoRecipient);
        }
        if !self.registry.exists(&input.trigger_code) {
            return Err(NotificationError::TriggerNotFound(input.trigger_code.clone()));
        }

        let language = input
            .requested_language()
            .unwrap_or(self.default_language.as_str());
        tracing::Span::current().record("language", language);

        let template = self.resolve_template(&input.trigger_code, language).await?;
        let params = self.merge_params(&input.params);

        self.deliver(&template, &input.recipient, params, Some(input))
            .await
    }

    /// Reserved for queued delivery.
    pub async fn send_async(&self, _input: SendInput) -> Result<()> {
        Err(NotificationError::NotImplemented(
            "asynchronous send is not implemented".to_string(),
        ))
    }

    /// Send a template to `recipient` using the declared example values.
    ///
    /// The template is looked up by id whatever its status, so drafts and
    /// disabled templates can be checked before they go live.
    #[tracing::instrument(skip(self))]
    pub async fn test_send(&self, template_id: i64, recipient: &str) -> Result<()> {
        if recipient.trim().is_empty() {
            return Err(NotificationError::NoRecipient);
        }

        let template = self.templates.get_by_id(template_id).await?;
        let mut params = example_params(&self.registry.get_all_params(&template.trigger_code));
        params.insert(CURRENT_YEAR.to_string(), Value::from(current_year()));

        self.deliver(&template, recipient, params, None).await
    }

    /// Render a template with the declared example values. Nothing is logged or sent.
    pub async fn preview_template(&self, template_id: i64) -> Result<PreviewResult> {
        let template = self.templates.get_by_id(template_id).await?;
        let declared = self.registry.get_all_params(&template.trigger_code);

        let subject = self.engine.preview(&template.subject, &declared)?;
        let body_html = self.engine.preview(&template.body_html, &declared)?;
        let body_text = if template.has_text_body() {
            self.engine.preview(&template.body_text, &declared)?
        } else {
            String::new()
        };

        Ok(PreviewResult {
            subject,
            body_html,
            body_text,
        })
    }

    /// The enabled template for the language, else the default language's.
    async fn resolve_template(&self, trigger_code: &str, language: &str) -> Result<Template> {
        match self.templates.get_active_template(trigger_code, language).await {
            Ok(template) => Ok(template),
            Err(err) if language != self.default_language => {
                tracing::info!(
                    requested = %language,
                    fallback = %self.default_language,
                    error = %err,
                    "No active template for requested language, using default"
                );
                let template = self
                    .templates
                    .get_active_template(trigger_code, &self.default_language)
                    .await?;
                SendMetrics::record_fallback();
                Ok(template)
            }
            Err(err) => Err(err),
        }
    }

    /// Common params, then `CurrentYear` unless common params set it, then caller params.
    pub fn merge_params(&self, caller: &Params) -> Params {
        let mut merged = self.common_params.clone();
        if !merged.contains_key(CURRENT_YEAR) {
            merged.insert(CURRENT_YEAR.to_string(), Value::from(current_year()));
        }
        merged.extend(caller.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    fn render(
        &self,
        template: &Template,
        params: &Params,
        subject_override: Option<&str>,
    ) -> Result<RenderedEmail> {
        let subject_source = subject_override
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(template.subject.as_str());

        self.render_parts(template, params, subject_source)
            .map_err(|err| {
                SendMetrics::record_render_failure();
                tracing::warn!(template_id = template.id, error = %err, "Template render failed");
                NotificationError::RenderFailed(err)
            })
    }

    fn render_parts(
        &self,
        template: &Template,
        params: &Params,
        subject_source: &str,
    ) -> std::result::Result<RenderedEmail, RenderError> {
        let subject = self.engine.render(subject_source, params)?;
        let body_html = self.engine.render(&template.body_html, params)?;
        let body_text = if template.has_text_body() {
            Some(self.engine.render(&template.body_text, params)?)
        } else {
            None
        };

        Ok(RenderedEmail {
            subject,
            body_html,
            body_text,
        })
    }

    async fn deliver(
        &self,
        template: &Template,
        recipient: &str,
        params: Params,
        input: Option<&SendInput>,
    ) -> Result<()> {
        let started = Instant::now();
        let rendered = self.render(template, &params, input.and_then(|i| i.subject.as_deref()))?;

        let mut log = self
            .logs
            .create(NewSendLog {
                template_id: Some(template.id),
                trigger_code: template.trigger_code.clone(),
                language: template.language.clone(),
                recipient: recipient.to_string(),
                subject: rendered.subject.clone(),
                params: Value::Object(params),
            })
            .await?;

        let outcome = match compose(template, recipient, rendered, input) {
            Ok(email) => self.transport.send(&email).await,
            Err(err) => Err(err),
        };

        let elapsed = started.elapsed().as_secs_f64();
        match &outcome {
            Ok(()) => {
                log.mark_sent();
                SendMetrics::record_sent(elapsed);
                tracing::info!(
                    log_id = log.id,
                    template_id = template.id,
                    transport = self.transport.name(),
                    "Email sent"
                );
            }
            Err(err) => {
                log.mark_failed(err.to_string());
                SendMetrics::record_failed(elapsed);
                tracing::error!(
                    log_id = log.id,
                    template_id = template.id,
                    error = %err,
                    "Email delivery failed"
                );
            }
        }

        self.finalize_log(&log).await;

        outcome.map_err(NotificationError::SendFailed)
    }

    /// The delivery outcome stands even if it cannot be recorded; the log stays pending.
    async fn finalize_log(&self, log: &SendLog) {
        if let Err(err) = self.logs.update(log).await {
            SendMetrics::record_finalize_failure();
            tracing::error!(
                log_id = log.id,
                status = %log.status,
                error = %err,
                "Failed to finalize send log"
            );
        }
    }
}

/// Build the envelope: template cc/bcc first, then per-send additions.
fn compose(
    template: &Template,
    recipient: &str,
    rendered: RenderedEmail,
    input: Option<&SendInput>,
) -> std::result::Result<OutboundEmail, TransportError> {
    let mut builder = OutboundEmail::builder()
        .to(recipient)
        .subject(rendered.subject)
        .html_body(rendered.body_html)
        .cc(&template.cc)
        .bcc(&template.bcc);

    if let Some(text) = rendered.body_text {
        builder = builder.text_body(text);
    }

    let reply_to = input
        .and_then(|i| i.reply_to.as_deref())
        .filter(|r| !r.trim().is_empty())
        .or_else(|| template.reply_to());
    if let Some(reply_to) = reply_to {
        builder = builder.reply_to(reply_to);
    }

    if let Some(input) = input {
        if let Some(from) = input.from.as_deref().filter(|f| !f.is_empty()) {
            builder = builder.from(from);
        }
        if let Some(name) = input.from_name.as_deref().filter(|n| !n.is_empty()) {
            builder = builder.from_name(name);
        }
        for cc in &input.cc {
            builder = builder.cc(cc);
        }
        for bcc in &input.bcc {
            builder = builder.bcc(bcc);
        }
        for attachment in &input.attachments {
            builder = builder.attach(
                attachment.filename.clone(),
                attachment.content.clone(),
                attachment.content_type.clone(),
            );
        }
    }

    builder.build()
}

fn current_year() -> i32 {
    Local::now().year()
}
