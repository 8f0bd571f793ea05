use serde::{Deserialize, Serialize};

use crate::models::{notification::AdminNotification, report::DispatchReport};

/// Body returned by the mass-notification endpoint on both the 200 and the
/// zero-success 400 paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub message: String,
    pub results: DispatchReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse<T> {
    pub message: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<AdminNotification>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total: u64,
    pub has_more: bool,
}
