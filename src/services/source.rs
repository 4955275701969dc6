use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::repositories::ContentSourceRepository;
use crate::models::{ContentSource, CreateSourceInput, UpdateSourceInput};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Source URL is unreachable: {0}")]
    Unreachable(String),

    #[error("Source not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Reachability check for source URLs. Abstracted so tests can stub the
/// network out.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn check(&self, url: &str) -> Result<(), String>;
}

/// Probe backed by a plain GET with a short timeout. Any HTTP status counts
/// as reachable; only connection-level failures are errors.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("geobit/0.3")
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlProbe for HttpProbe {
    async fn check(&self, url: &str) -> Result<(), String> {
        match self.client.get(url).send().await {
            Ok(_) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Registry of content sources the admin curates.
pub struct SourceService {
    sources: Arc<dyn ContentSourceRepository>,
    probe: Arc<dyn UrlProbe>,
}

impl SourceService {
    pub fn new(sources: Arc<dyn ContentSourceRepository>, probe: Arc<dyn UrlProbe>) -> Self {
        Self { sources, probe }
    }

    pub async fn list(&self) -> Result<Vec<ContentSource>, SourceError> {
        Ok(self.sources.list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<ContentSource, SourceError> {
        self.sources
            .get_by_id(id)
            .await?
            .ok_or(SourceError::NotFound)
    }

    /// Validate and register a new source. The URL must answer an HTTP
    /// request before the source is accepted.
    pub async fn add(&self, input: CreateSourceInput) -> Result<ContentSource, SourceError> {
        validate_name(&input.name)?;
        validate_url(&input.url)?;

        if let Err(reason) = self.probe.check(&input.url).await {
            return Err(SourceError::Unreachable(reason));
        }

        let source = ContentSource::new(input);
        self.sources.create(&source).await?;

        tracing::info!("Registered content source: {} ({})", source.name, source.url);
        Ok(source)
    }

    /// Apply a partial update. A changed URL is probed again before saving.
    pub async fn update(
        &self,
        id: &str,
        input: UpdateSourceInput,
    ) -> Result<ContentSource, SourceError> {
        let mut source = self
            .sources
            .get_by_id(id)
            .await?
            .ok_or(SourceError::NotFound)?;

        if let Some(name) = &input.name {
            validate_name(name)?;
        }
        if let Some(url) = &input.url {
            validate_url(url)?;
            if url != &source.url {
                if let Err(reason) = self.probe.check(url).await {
                    return Err(SourceError::Unreachable(reason));
                }
            }
        }

        source.apply(input);
        self.sources.update(&source).await?;
        Ok(source)
    }

    /// Remove a source. Deleting an id that does not exist is a no-op.
    pub async fn remove(&self, id: &str) -> Result<(), SourceError> {
        self.sources.delete(id).await?;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), SourceError> {
    if name.trim().is_empty() {
        return Err(SourceError::InvalidInput("Name cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), SourceError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(SourceError::InvalidInput(
            "URL must start with http:// or https://".to_string(),
        ));
    }
    Ok(())
}
