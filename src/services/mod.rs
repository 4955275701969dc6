//! Business logic services
//!
//! Services sit between the HTTP layer and the repositories. Each owns its
//! error enum; API handlers translate those into response envelopes.

pub mod article;
pub mod auth;
pub mod newsletter;
pub mod source;
pub mod subscriber;
pub mod summarizer;

pub use article::{ArticleError, ArticleService, NewArticleInput};
pub use auth::{AuthError, AuthService};
pub use newsletter::{NewsletterError, NewsletterService};
pub use source::{HttpProbe, SourceError, SourceService, UrlProbe};
pub use subscriber::{SubscribeOutcome, SubscriberError, SubscriberService};
pub use summarizer::{ChatApi, HttpChatApi, SummarizerError, SummarizerService, SummaryOutput};
