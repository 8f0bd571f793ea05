use std::collections::HashMap;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::{
    clients::PushGateway,
    config::Config,
    models::{
        fcm::{FcmMessage, FcmNotification, FcmRequest},
        retry::RetryConfig,
    },
    utils::retry_with_backoff,
};

pub struct FcmClient {
    http_client: Client,
    fcm_project_id: String,
    retry_config: RetryConfig,
}

impl FcmClient {
    pub fn new(config: &Config) -> Self {
        info!(project_id = %config.fcm_project_id, "FCM client initialized");

        Self {
            http_client: Client::new(),
            fcm_project_id: config.fcm_project_id.clone(),
            retry_config: config.retry_config(),
        }
    }

    async fn send_once(&self, request: &FcmRequest) -> Result<bool, Error> {
        let provider = gcp_auth::provider().await?;
        let scopes = &["https://www.googleapis.com/auth/firebase.messaging"];

        let token = provider.token(scopes).await?;

        let url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.fcm_project_id
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token.as_str())
            .json(request)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            debug!("FCM push notification accepted");
            return Ok(true);
        }

        let error_text = response.text().await?;

        // FCM signals a dead registration with 404 UNREGISTERED; that is a
        // token problem, not a transport fault.
        if status == StatusCode::NOT_FOUND || error_text.contains("UNREGISTERED") {
            warn!("FCM rejected the device token as unregistered");
            return Ok(false);
        }

        Err(anyhow!("FCM request failed: {}", error_text))
    }
}

#[async_trait]
impl PushGateway for FcmClient {
    async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<bool, Error> {
        debug!(device_token, "Sending FCM push notification");

        let request = FcmRequest {
            message: FcmMessage {
                token: device_token.to_string(),
                notification: FcmNotification {
                    title: title.to_string(),
                    body: body.to_string(),
                },
                data: Some(metadata.clone()),
            },
        };

        // Transport faults are retried here; a token rejection is a
        // definitive answer and comes back as Ok(false) immediately.
        retry_with_backoff(&self.retry_config, || self.send_once(&request)).await
    }
}
