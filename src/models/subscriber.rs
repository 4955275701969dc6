//! Subscriber model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscriber entity, unique by email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    /// Unique identifier
    pub id: String,
    /// Email address (unique across the registry)
    pub email: String,
    /// Categories the subscriber opted into
    pub categories: Vec<String>,
    /// Where the signup came from (landing page, referral, ...)
    pub source: Option<String>,
    /// Subscription status
    pub status: SubscriberStatus,
    /// When the subscription was created
    pub subscribed_at: DateTime<Utc>,
    /// When the subscriber opted out, if ever
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

impl Subscriber {
    /// Create a new active subscriber
    pub fn new(email: impl Into<String>, categories: Vec<String>, source: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.into(),
            categories,
            source,
            status: SubscriberStatus::Active,
            subscribed_at: Utc::now(),
            unsubscribed_at: None,
        }
    }
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    #[default]
    Active,
    Inactive,
}

impl SubscriberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriberStatus::Active => "active",
            SubscriberStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(SubscriberStatus::Active),
            "inactive" => Some(SubscriberStatus::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
