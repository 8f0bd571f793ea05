use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A durable per-user notification record, created as a side effect of each
/// successful delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub description: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub user_id: String,
    pub demand: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateNotification {
    pub title: String,
    pub description: String,
    pub kind: String,
    pub user_id: String,
    pub demand: Option<String>,
}

impl CreateNotification {
    pub fn new(title: String, description: String, kind: String, user_id: String) -> Self {
        Self {
            title,
            description,
            kind,
            user_id,
            demand: None,
        }
    }

    pub fn with_demand(mut self, demand: String) -> Self {
        self.demand = Some(demand);
        self
    }
}

/// A notification addressed to the admin audience as a whole rather than to
/// one user, fed by the live-connection broadcast path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminNotification {
    pub id: Uuid,
    pub title: String,
    pub description: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAdminNotification {
    pub title: String,
    pub description: String,
    pub kind: String,
}
