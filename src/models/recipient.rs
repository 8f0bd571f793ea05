use serde::{Deserialize, Serialize};

/// A user entity addressable by push notifications. The identifier is
/// opaque to this service; the device token is whatever the push provider
/// issued for the user's current installation, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub device_token: Option<String>,
    pub active: bool,
}

impl Recipient {
    /// The token usable for delivery, if one is present and non-empty.
    pub fn usable_token(&self) -> Option<&str> {
        self.device_token.as_deref().filter(|t| !t.is_empty())
    }
}
