use std::time::Duration;

use serde_json::json;

use crate::foundation::error::{OgError, OgResult};

/// Alert severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Informational.
    Info,
    /// Something failed but the service keeps running.
    Warning,
    /// Needs attention now.
    Critical,
}

impl Severity {
    /// Lowercase label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    fn emoji(self) -> &'static str {
        match self {
            Self::Info => ":incoming_envelope:",
            Self::Warning => ":warning:",
            Self::Critical => ":rotating_light:",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Info => "#36a64f",
            Self::Warning => "#F0D500",
            Self::Critical => "#F32013",
        }
    }
}

/// One operational alert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    /// Human-readable summary.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// Extra detail (for example an error chain); only rendered for critical alerts.
    pub details: Option<String>,
}

impl Alert {
    /// Alert without details.
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            details: None,
        }
    }

    /// Attach details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Out-of-band alerting sink. Never on the render critical path.
pub trait Notifier: Send + Sync {
    /// Deliver `alert`.
    fn send(&self, alert: &Alert) -> OgResult<()>;

    /// Deliver a plain message.
    fn notify(&self, message: &str, severity: Severity) -> OgResult<()> {
        self.send(&Alert::new(message, severity))
    }
}

/// Notifier that only writes to the tracing log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send(&self, alert: &Alert) -> OgResult<()> {
        match alert.severity {
            Severity::Info => tracing::info!(details = ?alert.details, "{}", alert.message),
            Severity::Warning => tracing::warn!(details = ?alert.details, "{}", alert.message),
            Severity::Critical => tracing::error!(details = ?alert.details, "{}", alert.message),
        }
        Ok(())
    }
}

/// Slack incoming-webhook notifier.
#[derive(Clone, Debug)]
pub struct SlackNotifier {
    client: reqwest::blocking::Client,
    webhook_url: String,
    mention: Option<String>,
}

impl SlackNotifier {
    /// Post to `webhook_url`, giving up after `timeout`.
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> OgResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OgError::configuration(format!("build webhook client: {e}")))?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
            mention: None,
        })
    }

    /// Tag (for example `<@U123>`) prepended to warning and critical alerts.
    pub fn with_mention(mut self, mention: impl Into<String>) -> Self {
        self.mention = Some(mention.into());
        self
    }

    /// Webhook body for `alert`.
    pub fn payload(&self, alert: &Alert) -> serde_json::Value {
        let sev = alert.severity;
        let tag = match sev {
            Severity::Info => "",
            Severity::Warning | Severity::Critical => self.mention.as_deref().unwrap_or(""),
        };
        let mut blocks = vec![json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("{} *{}* \n\n{tag}\n{}", sev.emoji(), sev.label(), alert.message),
            }
        })];
        if let (Severity::Critical, Some(details)) = (sev, alert.details.as_deref()) {
            blocks.push(json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": format!("```{details}```") }
            }));
        }
        json!({ "attachments": [{ "color": sev.color(), "blocks": blocks }] })
    }
}

impl Notifier for SlackNotifier {
    fn send(&self, alert: &Alert) -> OgResult<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.payload(alert))
            .send()
            .map_err(|e| OgError::upstream(format!("slack webhook: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OgError::upstream(format!(
                "slack notification failed: {status} - {body}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/collab/notify.rs"]
mod tests;
