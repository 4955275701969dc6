//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod article;
pub mod content_source;
pub mod newsletter;
pub mod session;
pub mod subscriber;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use content_source::{ContentSourceRepository, SqlxContentSourceRepository};
pub use newsletter::{NewsletterRepository, SqlxNewsletterRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use subscriber::{DuplicateEmail, SqlxSubscriberRepository, SubscriberRepository};
