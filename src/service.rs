// src/service.rs

//! Tip service façade.
//!
//! Validates requests, orchestrates the preview extractor and the tip
//! store, and maps failures onto the small error taxonomy carried over
//! the wire. Stateless across calls; the store holds all durable state.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::{AppError, Result};
use crate::models::{NewTip, ServerConfig, Tip};
use crate::preview::PreviewExtractor;
use crate::store::{TipStore, TipStream, TitleFilter};

/// The remote-procedure façade over extractor and store.
pub struct TipService {
    store: Arc<dyn TipStore>,
    extractor: PreviewExtractor,
    op_timeout: Duration,
}

impl TipService {
    /// Create a new service with the given collaborators.
    pub fn new(store: Arc<dyn TipStore>, extractor: PreviewExtractor, config: &ServerConfig) -> Self {
        Self {
            store,
            extractor,
            op_timeout: Duration::from_secs(config.op_timeout_secs),
        }
    }

    /// Bookmark a page: pre-check reachability, extract the preview,
    /// persist, and return the fully populated tip.
    ///
    /// No partial tip is ever returned; extraction or storage failures
    /// abort the whole operation.
    pub async fn create_tip(&self, url: &str) -> Result<Tip> {
        if url.trim().is_empty() {
            return Err(AppError::invalid_argument("url must not be empty"));
        }
        url::Url::parse(url)
            .map_err(|e| AppError::invalid_argument(format!("malformed url {url}: {e}")))?;

        timeout(self.op_timeout, self.create_inner(url))
            .await
            .map_err(|_| AppError::timeout("create_tip"))?
    }

    async fn create_inner(&self, url: &str) -> Result<Tip> {
        self.extractor.check_reachable(url).await?;
        let preview = self.extractor.extract(url).await?;
        let record = NewTip {
            title: preview.title,
            url: url.to_string(),
            description: preview.description,
            image: preview.image,
        };
        let id = self.store.insert(record.clone()).await?;
        log::info!("new tip created: {id} ({url})");
        Ok(record.with_id(id))
    }

    /// Remove a tip, echoing the deleted id for caller-side confirmation.
    pub async fn delete_tip(&self, id: &str) -> Result<String> {
        timeout(self.op_timeout, self.store.delete_by_id(id))
            .await
            .map_err(|_| AppError::timeout("delete_tip"))??;
        log::info!("tip deleted: {id}");
        Ok(id.to_string())
    }

    /// Stream every stored tip.
    pub async fn all_tips(&self) -> Result<TipStream> {
        self.store.scan(TitleFilter::all()).await
    }

    /// Stream tips whose title contains the substring, case-insensitively.
    /// An empty substring streams every tip.
    pub async fn search_tips(&self, title: &str) -> Result<TipStream> {
        self.store.scan(TitleFilter::new(title)).await
    }
}
