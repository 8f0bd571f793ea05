use std::{collections::HashMap, sync::Arc};

use anyhow::{Error, anyhow};
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::{
    clients::{NotificationStore, PushGateway, RecipientResolver},
    error::DispatchError,
    models::{
        notification::CreateNotification,
        report::{DispatchReport, OutcomeRecord},
        request::{DispatchRequest, RecipientMode},
    },
};

/// Upper bound on concurrent in-flight gateway/store calls per dispatch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Sends one message to a set of recipients with per-recipient outcome
/// accounting.
///
/// Recipients are processed in fixed-size batches: batches run strictly one
/// after another, recipients within a batch concurrently. A recipient fault
/// never escapes its own outcome record. Dispatch is deliberately not
/// idempotent; re-invoking re-sends to every recipient.
#[derive(Clone)]
pub struct Dispatcher {
    resolver: Arc<dyn RecipientResolver>,
    store: Arc<dyn NotificationStore>,
    gateway: Arc<dyn PushGateway>,
    batch_size: usize,
}

impl Dispatcher {
    pub fn new(
        resolver: Arc<dyn RecipientResolver>,
        store: Arc<dyn NotificationStore>,
        gateway: Arc<dyn PushGateway>,
    ) -> Self {
        Self {
            resolver,
            store,
            gateway,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Runs one mass dispatch. Fails only on malformed input or on a
    /// request-wide fault (e.g. the resolver being unreachable); every
    /// per-recipient failure is captured inside the returned report.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchReport, DispatchError> {
        if request.title.is_empty() || request.message.is_empty() {
            return Err(DispatchError::Validation(
                "Title and message are required".to_string(),
            ));
        }

        let user_ids: Vec<String> = match request.mode {
            RecipientMode::All => self
                .resolver
                .list_active_recipients_with_token()
                .await?
                .into_iter()
                .map(|recipient| recipient.id)
                .collect(),
            RecipientMode::Selected => request.users.clone(),
        };

        info!(
            total = user_ids.len(),
            mode = ?request.mode,
            kind = %request.kind,
            "Starting mass notification dispatch"
        );

        let mut report = DispatchReport::new(user_ids.len());

        for (batch_index, batch) in user_ids.chunks(self.batch_size).enumerate() {
            debug!(batch_index, batch_len = batch.len(), "Dispatching batch");

            // join_all yields results in task order, so the batch settles
            // into the report deterministically without a shared lock.
            let outcomes = join_all(
                batch
                    .iter()
                    .map(|user_id| self.process_recipient(user_id, &request)),
            )
            .await;

            for outcome in outcomes {
                report.record(outcome);
            }
        }

        info!(
            total = report.total,
            success = report.success,
            failures = report.failures,
            invalid_tokens = report.invalid_tokens,
            "Mass notification dispatch finished"
        );

        Ok(report)
    }

    /// Processes a single recipient, absorbing every fault into the
    /// returned outcome so siblings in the batch are unaffected.
    async fn process_recipient(&self, user_id: &str, request: &DispatchRequest) -> OutcomeRecord {
        match self.attempt_delivery(user_id, request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(user_id, error = %e, "Recipient processing failed");
                OutcomeRecord::failure(user_id.to_string(), e.to_string())
            }
        }
    }

    async fn attempt_delivery(
        &self,
        user_id: &str,
        request: &DispatchRequest,
    ) -> Result<OutcomeRecord, Error> {
        // Fresh read in every mode: tokens may have changed since the
        // recipient set was resolved.
        let recipient = self.store.find_recipient_by_id(user_id).await?;

        let Some(token) = recipient.as_ref().and_then(|r| r.usable_token()) else {
            return Ok(OutcomeRecord::invalid_token(user_id.to_string()));
        };

        let metadata = HashMap::from([("type".to_string(), request.kind.clone())]);

        let sent = self
            .gateway
            .send(token, &request.title, &request.message, &metadata)
            .await
            .map_err(|e| anyhow!("FCM error: {}", e))?;

        if sent {
            self.store
                .create_notification(CreateNotification::new(
                    request.title.clone(),
                    request.message.clone(),
                    request.kind.clone(),
                    user_id.to_string(),
                ))
                .await?;

            return Ok(OutcomeRecord::success(user_id.to_string()));
        }

        // Provider rejected the token; clearing it is best-effort and does
        // not change the classification.
        if let Err(e) = self.store.clear_device_token(user_id).await {
            warn!(user_id, error = %e, "Failed to clear rejected device token");
        }

        Ok(OutcomeRecord::invalid_token(user_id.to_string()))
    }
}

/// Caller-facing summary line for a finished report.
pub fn summary_message(report: &DispatchReport) -> String {
    format!(
        "Notifications processed ({} success, {} failures)",
        report.success, report.failures
    )
}
