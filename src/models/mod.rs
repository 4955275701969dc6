//! Domain models
//!
//! Typed entities for the GeoBit newsletter system. Incoming payloads are
//! parsed into these before any business logic runs.

pub mod article;
pub mod content_source;
pub mod newsletter;
pub mod session;
pub mod subscriber;

pub use article::Article;
pub use content_source::{ContentSource, CreateSourceInput, UpdateSourceInput};
pub use newsletter::{Newsletter, NewsletterStatus, Section};
pub use session::AdminSession;
pub use subscriber::{Subscriber, SubscriberStatus};
