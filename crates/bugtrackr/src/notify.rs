//! Assignment notifications.
//!
//! Delivery happens out of process: [`HttpDispatcher`] posts
//! `{to, subject, message}` to a callable endpoint and reads back
//! `{success, error?}`. Callers treat dispatch as best-effort; a failure is
//! logged and never undoes the bug it was about.

use crate::domain::Bug;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Default request timeout for [`HttpDispatcher`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One message for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Recipient address
    pub to: String,

    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub message: String,
}

impl Notification {
    /// The "you've been assigned" message for a freshly filed bug.
    pub fn bug_assigned(bug: &Bug) -> Self {
        Self {
            to: bug.assigned_email.clone(),
            subject: format!("New Bug Assigned: {}", bug.title),
            message: format!(
                "You have been assigned a new bug: \"{}\" (priority: {}).",
                bug.title, bug.priority
            ),
        }
    }
}

/// What the callable endpoint answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResponse {
    /// Whether delivery was accepted
    pub success: bool,

    /// Reason for refusal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Why a notification wasn't delivered.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Transport-level failure (connect, timeout, bad body)
    #[error("notification request failed: {0}")]
    Http(String),

    /// Endpoint answered with a non-success status
    #[error("notification endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if readable
        body: String,
    },

    /// Endpoint answered `success: false`
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Out-of-process notification delivery.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver one notification.
    async fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError>;
}

/// Posts notifications as JSON to a callable endpoint.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    endpoint: String,
    http: Client,
}

impl HttpDispatcher {
    /// Create a dispatcher for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Http`] if the HTTP client can't be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DispatchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Http(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    /// The configured endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NotificationDispatcher for HttpDispatcher {
    async fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(notification)
            .send()
            .await
            .map_err(|e| DispatchError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let answer: DispatchResponse = resp
            .json()
            .await
            .map_err(|e| DispatchError::Http(e.to_string()))?;
        if answer.success {
            Ok(())
        } else {
            Err(DispatchError::Rejected(
                answer.error.unwrap_or_else(|| "no reason given".to_string()),
            ))
        }
    }
}

/// Writes notifications to the log instead of delivering them. Used when no
/// endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            "Notification (not delivered, no endpoint configured)"
        );
        Ok(())
    }
}
