use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::db::repositories::{DuplicateEmail, SubscriberRepository};
use crate::models::{Subscriber, SubscriberStatus};

#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("No subscription found for that email")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result of a subscribe call: a fresh signup or a repeat.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
}

/// Subscriber signup and management.
pub struct SubscriberService {
    subscribers: Arc<dyn SubscriberRepository>,
}

impl SubscriberService {
    pub fn new(subscribers: Arc<dyn SubscriberRepository>) -> Self {
        Self { subscribers }
    }

    /// Register an email address. Repeat signups report `AlreadySubscribed`;
    /// a previously unsubscribed address is reactivated. The existence check
    /// and insert are not atomic, so a concurrent duplicate insert can slip
    /// through to the store's unique index, which we fold into the same
    /// `AlreadySubscribed` outcome.
    pub async fn subscribe(
        &self,
        email: &str,
        categories: Vec<String>,
        source: Option<String>,
    ) -> Result<SubscribeOutcome, SubscriberError> {
        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(SubscriberError::InvalidEmail);
        }

        if let Some(mut existing) = self.subscribers.get_by_email(email).await? {
            if existing.status == SubscriberStatus::Active {
                return Ok(SubscribeOutcome::AlreadySubscribed);
            }
            existing.status = SubscriberStatus::Active;
            existing.unsubscribed_at = None;
            if !categories.is_empty() {
                existing.categories = categories;
            }
            self.subscribers.update(&existing).await?;
            tracing::info!("Reactivated subscriber {}", existing.id);
            return Ok(SubscribeOutcome::Subscribed);
        }

        let subscriber = Subscriber::new(email, categories, source);
        match self.subscribers.create(&subscriber).await {
            Ok(_) => {
                tracing::info!("New subscriber {}", subscriber.id);
                Ok(SubscribeOutcome::Subscribed)
            }
            Err(e) if e.downcast_ref::<DuplicateEmail>().is_some() => {
                Ok(SubscribeOutcome::AlreadySubscribed)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deactivate a subscription. Fails with `NotFound` when the email has
    /// never subscribed; repeating the call on an inactive record succeeds
    /// and refreshes the unsubscribe timestamp.
    pub async fn unsubscribe(&self, email: &str) -> Result<(), SubscriberError> {
        let email = email.trim();
        let mut subscriber = self
            .subscribers
            .get_by_email(email)
            .await?
            .ok_or(SubscriberError::NotFound)?;

        subscriber.status = SubscriberStatus::Inactive;
        subscriber.unsubscribed_at = Some(Utc::now());
        self.subscribers.update(&subscriber).await?;

        tracing::info!("Unsubscribed {}", subscriber.id);
        Ok(())
    }

    /// Paginated listing plus the total count across all pages.
    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Subscriber>, i64), SubscriberError> {
        let limit = limit.clamp(1, 100);
        let offset = offset.max(0);
        let subscribers = self.subscribers.list(limit, offset).await?;
        let total = self.subscribers.count().await?;
        Ok((subscribers, total))
    }
}

/// Shallow shape check only. Real deliverability is out of scope; the
/// double-opt-in flow is where bad addresses get weeded out.
fn is_plausible_email(email: &str) -> bool {
    !email.is_empty() && email.contains('@') && email.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxSubscriberRepository;
    use crate::db::{create_test_pool, run_migrations};

    async fn setup() -> SubscriberService {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        SubscriberService::new(Arc::new(SqlxSubscriberRepository::new(pool)))
    }

    #[tokio::test]
    async fn test_subscribe_and_repeat() {
        let service = setup().await;

        let first = service
            .subscribe("ada@example.com", vec!["geology".to_string()], None)
            .await
            .unwrap();
        assert_eq!(first, SubscribeOutcome::Subscribed);

        let second = service
            .subscribe("ada@example.com", Vec::new(), None)
            .await
            .unwrap();
        assert_eq!(second, SubscribeOutcome::AlreadySubscribed);

        let (subscribers, total) = service.list(50, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(subscribers[0].email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_subscribe_rejects_malformed_email() {
        let service = setup().await;

        for bad in ["", "nodomain", "missing-at.example.com", "a@b"] {
            let result = service.subscribe(bad, Vec::new(), None).await;
            assert!(
                matches!(result, Err(SubscriberError::InvalidEmail)),
                "expected rejection for {:?}",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_then_resubscribe_reactivates() {
        let service = setup().await;
        service
            .subscribe("ada@example.com", vec!["geology".to_string()], None)
            .await
            .unwrap();

        service.unsubscribe("ada@example.com").await.unwrap();
        let (subscribers, _) = service.list(50, 0).await.unwrap();
        assert_eq!(subscribers[0].status, SubscriberStatus::Inactive);
        assert!(subscribers[0].unsubscribed_at.is_some());

        let outcome = service
            .subscribe("ada@example.com", Vec::new(), None)
            .await
            .unwrap();
        assert_eq!(outcome, SubscribeOutcome::Subscribed);

        let (subscribers, total) = service.list(50, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(subscribers[0].status, SubscriberStatus::Active);
        assert!(subscribers[0].unsubscribed_at.is_none());
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_email_is_not_found() {
        let service = setup().await;

        let result = service.unsubscribe("ghost@example.com").await;
        assert!(matches!(result, Err(SubscriberError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_pagination_clamps_limit() {
        let service = setup().await;
        for i in 0..5 {
            service
                .subscribe(&format!("user{}@example.com", i), Vec::new(), None)
                .await
                .unwrap();
        }

        let (page, total) = service.list(2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(total, 5);

        // Out-of-range limits are clamped rather than rejected.
        let (page, _) = service.list(0, 0).await.unwrap();
        assert_eq!(page.len(), 1);
        let (page, _) = service.list(1000, 0).await.unwrap();
        assert_eq!(page.len(), 5);
    }
}
