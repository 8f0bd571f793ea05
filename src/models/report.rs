use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Classification of one recipient's processing result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    InvalidToken,
    Failure,
}

impl Display for OutcomeStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            OutcomeStatus::Success => write!(f, "success"),
            OutcomeStatus::InvalidToken => write!(f, "invalid_token"),
            OutcomeStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Exactly one of these is produced per recipient attempted, never mutated
/// once appended to the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub user_id: String,
    pub status: OutcomeStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutcomeRecord {
    pub fn success(user_id: String) -> Self {
        Self {
            user_id,
            status: OutcomeStatus::Success,
            error: None,
        }
    }

    pub fn invalid_token(user_id: String) -> Self {
        Self {
            user_id,
            status: OutcomeStatus::InvalidToken,
            error: None,
        }
    }

    pub fn failure(user_id: String, error: String) -> Self {
        Self {
            user_id,
            status: OutcomeStatus::Failure,
            error: Some(error),
        }
    }
}

/// Aggregate dispatch result.
///
/// Counting convention: an `invalid_token` outcome increments both
/// `failures` and `invalid_tokens`, so `success + failures == total` and
/// `invalid_tokens <= failures`. Callers relying on the wire format depend
/// on this, so it must not be "fixed".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub total: usize,
    pub success: usize,
    pub failures: usize,

    #[serde(rename = "invalidTokens")]
    pub invalid_tokens: usize,

    pub details: Vec<OutcomeRecord>,
}

impl DispatchReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            success: 0,
            failures: 0,
            invalid_tokens: 0,
            details: Vec::with_capacity(total),
        }
    }

    /// Folds one recipient outcome into the aggregate counters and appends
    /// it to the itemized list.
    pub fn record(&mut self, outcome: OutcomeRecord) {
        match outcome.status {
            OutcomeStatus::Success => self.success += 1,
            OutcomeStatus::InvalidToken => {
                self.failures += 1;
                self.invalid_tokens += 1;
            }
            OutcomeStatus::Failure => self.failures += 1,
        }

        self.details.push(outcome);
    }
}
