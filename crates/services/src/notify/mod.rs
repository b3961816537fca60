//! Outbound account notifications.
//!
//! Business operations hand a [`Notification`] to [`Notifier::notify`] after
//! their state change has been written. Delivery happens on a background
//! worker; its outcome is logged and never reported back to the caller.

pub mod mailer;
pub mod templates;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub use mailer::{HttpMailer, LogMailer, Mailer, OutboundEmail};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    Registered,
    Approved { buddy_id: String },
    Rejected { reason: String },
    Banned { reason: String },
    Unbanned,
    Deleted,
}

impl NotificationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationEvent::Registered => "registered",
            NotificationEvent::Approved { .. } => "approved",
            NotificationEvent::Rejected { .. } => "rejected",
            NotificationEvent::Banned { .. } => "banned",
            NotificationEvent::Unbanned => "unbanned",
            NotificationEvent::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub recipient_email: String,
    pub recipient_name: String,
    pub event: NotificationEvent,
}

impl Notification {
    pub fn new(
        recipient_email: impl Into<String>,
        recipient_name: impl Into<String>,
        event: NotificationEvent,
    ) -> Self {
        Self {
            recipient_email: recipient_email.into(),
            recipient_name: recipient_name.into(),
            event,
        }
    }
}

/// Handle to the notification queue. Cheap to clone.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    /// Start the delivery worker on the current tokio runtime.
    pub fn spawn(mailer: Arc<dyn Mailer>, from_address: String, queue_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Notification>(queue_capacity.max(1));

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                let email = templates::render(&notification, &from_address);
                match mailer.send(&email).await {
                    Ok(()) => {
                        debug!(
                            event = notification.event.name(),
                            to = %notification.recipient_email,
                            "Notification delivered"
                        );
                    }
                    Err(error) => {
                        warn!(
                            event = notification.event.name(),
                            to = %notification.recipient_email,
                            %error,
                            "Notification delivery failed"
                        );
                    }
                }
            }
            debug!("Notification worker stopped");
        });

        Self { tx }
    }

    /// Enqueue without waiting. A full or closed queue drops the message.
    pub fn notify(&self, notification: Notification) {
        if let Err(error) = self.tx.try_send(notification) {
            let dropped = match &error {
                mpsc::error::TrySendError::Full(n) | mpsc::error::TrySendError::Closed(n) => n,
            };
            warn!(
                event = dropped.event.name(),
                to = %dropped.recipient_email,
                %error,
                "Notification dropped"
            );
        }
    }
}
