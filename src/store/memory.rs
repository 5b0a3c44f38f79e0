//! In-memory storage backend.
//!
//! Keeps tips in insertion order behind an async lock. Used by the test
//! suite and as a development backend when no MongoDB deployment is
//! around; the contract matches [`MongoTipStore`](super::MongoTipStore)
//! including the zero-match delete failure.

use async_trait::async_trait;
use futures::stream;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{NewTip, Tip};
use crate::store::{TipStore, TipStream, TitleFilter, parse_id};

/// In-memory tip store preserving insertion order.
#[derive(Default)]
pub struct MemoryTipStore {
    tips: RwLock<Vec<Tip>>,
}

impl MemoryTipStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tips.
    pub async fn len(&self) -> usize {
        self.tips.read().await.len()
    }

    /// Whether the store holds no tips.
    pub async fn is_empty(&self) -> bool {
        self.tips.read().await.is_empty()
    }
}

#[async_trait]
impl TipStore for MemoryTipStore {
    async fn insert(&self, tip: NewTip) -> Result<String> {
        let id = ObjectId::new().to_hex();
        let mut tips = self.tips.write().await;
        tips.push(tip.with_id(id.clone()));
        Ok(id)
    }

    async fn delete_by_id(&self, id: &str) -> Result<u64> {
        let oid = parse_id(id)?;
        let hex = oid.to_hex();
        let mut tips = self.tips.write().await;
        let before = tips.len();
        tips.retain(|tip| tip.id != hex);
        match before - tips.len() {
            0 => Err(AppError::internal(format!(
                "cannot delete the tip with the specified id: {id}"
            ))),
            deleted => Ok(deleted as u64),
        }
    }

    async fn scan(&self, filter: TitleFilter) -> Result<TipStream> {
        let matched: Vec<Tip> = self
            .tips
            .read()
            .await
            .iter()
            .filter(|tip| filter.matches(&tip.title))
            .cloned()
            .collect();
        Ok(Box::pin(stream::iter(
            matched.into_iter().map(Ok::<Tip, AppError>),
        )))
    }
}
