//! Content source model
//!
//! A content source is a registered origin (feed/site) from which articles
//! may be gathered. Sources carry an optional CSS selector hint for scrapers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content source entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSource {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Origin URL
    pub url: String,
    /// Informational category tag
    pub category: Option<String>,
    /// CSS selector hint for scraping
    pub scrape_selector: Option<String>,
    /// Whether the source participates in ingestion
    pub active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ContentSource {
    /// Create a new active source from an input
    pub fn new(input: CreateSourceInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            url: input.url,
            category: input.category,
            scrape_selector: input.scrape_selector,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update, stamping `updated_at`
    pub fn apply(&mut self, update: UpdateSourceInput) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(url) = update.url {
            self.url = url;
        }
        if let Some(category) = update.category {
            self.category = Some(category);
        }
        if let Some(selector) = update.scrape_selector {
            self.scrape_selector = Some(selector);
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        self.updated_at = Utc::now();
    }
}

/// Input for registering a new content source
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSourceInput {
    pub name: String,
    pub url: String,
    pub category: Option<String>,
    pub scrape_selector: Option<String>,
}

/// Partial update for an existing source.
///
/// Deliberately carries no `created_at` or token fields, so caller-supplied
/// values for those can never reach the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSourceInput {
    pub name: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub scrape_selector: Option<String>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> CreateSourceInput {
        CreateSourceInput {
            name: "Nature".to_string(),
            url: "https://nature.com".to_string(),
            category: Some("journals".to_string()),
            scrape_selector: None,
        }
    }

    #[test]
    fn test_new_source_is_active() {
        let source = ContentSource::new(sample_input());
        assert!(source.active);
        assert_eq!(source.name, "Nature");
        assert_eq!(source.created_at, source.updated_at);
    }

    #[test]
    fn test_apply_stamps_updated_at() {
        let mut source = ContentSource::new(sample_input());
        let before = source.updated_at;
        source.apply(UpdateSourceInput {
            name: Some("Nature Geoscience".to_string()),
            ..Default::default()
        });
        assert_eq!(source.name, "Nature Geoscience");
        assert!(source.updated_at >= before);
        // untouched fields survive
        assert_eq!(source.url, "https://nature.com");
    }

    #[test]
    fn test_apply_can_deactivate() {
        let mut source = ContentSource::new(sample_input());
        source.apply(UpdateSourceInput {
            active: Some(false),
            ..Default::default()
        });
        assert!(!source.active);
    }
}
