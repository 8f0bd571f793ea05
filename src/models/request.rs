use serde::{Deserialize, Serialize};

/// How the recipient set of a mass dispatch is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientMode {
    /// Every active user with a registered device token, resolved once
    /// before batching. The request's `users` list is ignored.
    All,
    /// The request's `users` list verbatim, duplicates included.
    #[default]
    Selected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub title: String,
    pub message: String,

    #[serde(default)]
    pub users: Vec<String>,

    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub mode: RecipientMode,
}

fn default_kind() -> String {
    "promotion".to_string()
}

/// Body of `POST /notification/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub title: String,
    pub description: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub user_id: String,

    #[serde(default)]
    pub demand: Option<String>,
}

/// Query parameters of `GET /notification/all`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    4
}
