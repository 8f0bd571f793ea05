use std::collections::HashMap;

use anyhow::Error;
use async_trait::async_trait;

use crate::models::{
    notification::{AdminNotification, CreateAdminNotification, CreateNotification, Notification},
    recipient::Recipient,
};

pub mod database;
pub mod fcm;

/// Expands an "all active users" directive into concrete recipients.
#[async_trait]
pub trait RecipientResolver: Send + Sync {
    /// Every active recipient that currently has a non-empty device token.
    async fn list_active_recipients_with_token(&self) -> Result<Vec<Recipient>, Error>;
}

/// The durable store for user records and notification history.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn find_recipient_by_id(&self, id: &str) -> Result<Option<Recipient>, Error>;

    /// Removes a recipient's device token. Idempotent; callers treat
    /// failures as best-effort.
    async fn clear_device_token(&self, id: &str) -> Result<(), Error>;

    async fn create_notification(&self, record: CreateNotification) -> Result<Notification, Error>;

    async fn create_admin_notification(
        &self,
        record: CreateAdminNotification,
    ) -> Result<AdminNotification, Error>;

    /// One page of the admin feed, newest first. `page` is 1-based.
    async fn list_admin_notifications(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<Vec<AdminNotification>, Error>;

    async fn count_admin_notifications(&self) -> Result<u64, Error>;

    async fn health_check(&self) -> Result<(), Error>;
}

/// The external push-delivery provider.
///
/// `Ok(true)` means the provider accepted the delivery, `Ok(false)` means it
/// rejected the token (e.g. an unregistered device), and `Err` is a
/// transport or provider fault.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<bool, Error>;
}
