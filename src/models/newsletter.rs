//! Newsletter model
//!
//! This module provides:
//! - `Newsletter` entity with its ordered `sections` list
//! - `NewsletterStatus` enum for the draft/published lifecycle
//! - Section operations (move/edit/remove) applied to a local copy prior to save
//!
//! The sections list order defines display/email order. Section ids are
//! unique within a newsletter and stable across edits: reordering swaps
//! position, never identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Newsletter entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Newsletter {
    /// Unique identifier
    pub id: String,
    /// Issue title
    pub title: String,
    /// Ordered sections; order defines display order
    pub sections: Vec<Section>,
    /// Lifecycle status
    pub status: NewsletterStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Publication timestamp, set once on first publish
    pub published_at: Option<DateTime<Utc>>,
}

/// A single section of a newsletter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Stable identifier, unique within the newsletter. Sections submitted
    /// without one (freshly added in the editor) get an id on deserialize.
    #[serde(default = "new_section_id")]
    pub id: String,
    /// Section heading
    pub title: String,
    /// Section body
    pub content: String,
}

fn new_section_id() -> String {
    Uuid::new_v4().to_string()
}

impl Section {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: new_section_id(),
            title: title.into(),
            content: content.into(),
        }
    }
}

impl Newsletter {
    /// Create a new draft with the given title and sections
    pub fn draft(title: impl Into<String>, sections: Vec<Section>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            sections,
            status: NewsletterStatus::Draft,
            created_at: now,
            updated_at: now,
            published_at: None,
        }
    }

    /// Move the section at `from` to position `to`, shifting neighbors.
    /// Out-of-range indices are ignored.
    pub fn move_section(&mut self, from: usize, to: usize) {
        if from >= self.sections.len() || to >= self.sections.len() || from == to {
            return;
        }
        let section = self.sections.remove(from);
        self.sections.insert(to, section);
    }

    /// Remove the section with the given id. Unknown ids are a no-op.
    pub fn remove_section(&mut self, section_id: &str) {
        self.sections.retain(|s| s.id != section_id);
    }

    /// Replace the title/content of the section with the given id, keeping
    /// its identity and position. Unknown ids are a no-op.
    pub fn edit_section(&mut self, section_id: &str, title: Option<String>, content: Option<String>) {
        if let Some(section) = self.sections.iter_mut().find(|s| s.id == section_id) {
            if let Some(title) = title {
                section.title = title;
            }
            if let Some(content) = content {
                section.content = content;
            }
        }
    }
}

/// Newsletter lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NewsletterStatus {
    /// Draft - editable, not visible to readers
    #[default]
    Draft,
    /// Published - visible; edits are allowed but do not revert status
    Published,
}

impl NewsletterStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsletterStatus::Draft => "draft",
            NewsletterStatus::Published => "published",
        }
    }

    /// Parse status from database string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(NewsletterStatus::Draft),
            "published" => Some(NewsletterStatus::Published),
            _ => None,
        }
    }
}

impl std::fmt::Display for NewsletterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn newsletter_with_sections(count: usize) -> Newsletter {
        Newsletter::draft(
            "issue",
            (0..count)
                .map(|i| Section::new(format!("s{i}"), format!("body {i}")))
                .collect(),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        /// Reordering preserves the set of section ids and total count,
        /// only permuting order.
        #[test]
        fn property_move_preserves_id_set(
            count in 1usize..8,
            moves in prop::collection::vec((0usize..8, 0usize..8), 0..12),
        ) {
            let mut n = newsletter_with_sections(count);
            let ids_before: BTreeSet<String> =
                n.sections.iter().map(|s| s.id.clone()).collect();

            for (from, to) in moves {
                n.move_section(from, to);
            }

            let ids_after: BTreeSet<String> =
                n.sections.iter().map(|s| s.id.clone()).collect();
            prop_assert_eq!(n.sections.len(), count);
            prop_assert_eq!(ids_before, ids_after);
        }

        /// Removing a section decreases count by exactly one and its id
        /// is absent from the result.
        #[test]
        fn property_remove_drops_one(count in 1usize..8, pick in 0usize..8) {
            let mut n = newsletter_with_sections(count);
            let victim = n.sections[pick % count].id.clone();

            n.remove_section(&victim);

            prop_assert_eq!(n.sections.len(), count - 1);
            prop_assert!(n.sections.iter().all(|s| s.id != victim));
        }
    }
}
