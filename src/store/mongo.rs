//! MongoDB storage backend.

use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{DbConfig, NewTip, Tip};
use crate::store::{TipStore, TipStream, TitleFilter, parse_id};

/// Persisted document shape of a tip.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TipDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    title: String,
    url: String,
    description: String,
    image: String,
}

impl TipDocument {
    fn into_tip(self) -> Result<Tip> {
        let id = self
            .id
            .ok_or_else(|| AppError::internal("stored tip document has no _id"))?;
        Ok(Tip {
            id: id.to_hex(),
            title: self.title,
            url: self.url,
            description: self.description,
            image: self.image,
        })
    }
}

/// MongoDB-backed tip store over a single collection.
#[derive(Clone)]
pub struct MongoTipStore {
    client: Client,
    collection: Collection<TipDocument>,
}

impl MongoTipStore {
    /// Connect to MongoDB and bind the configured collection.
    ///
    /// The driver connects lazily; use [`MongoTipStore::ping`] to confirm
    /// the deployment is actually reachable.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.uri).await?;
        let collection = client
            .database(&config.name)
            .collection::<TipDocument>(&config.collection);
        Ok(Self { client, collection })
    }

    /// Round-trip a ping through the deployment.
    pub async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    /// The name of the bound collection.
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Translate a title filter into a find document.
    ///
    /// The needle is regex-escaped so the match stays a plain substring
    /// test; `$options: "i"` makes it case-insensitive.
    fn filter_document(filter: &TitleFilter) -> Document {
        if filter.needle().is_empty() {
            doc! {}
        } else {
            doc! {
                "title": {
                    "$regex": regex::escape(filter.needle()),
                    "$options": "i",
                }
            }
        }
    }
}

#[async_trait]
impl TipStore for MongoTipStore {
    async fn insert(&self, tip: NewTip) -> Result<String> {
        // Assign the id client-side so the insert result is typed from
        // the start instead of downcast from the driver's raw value.
        let id = ObjectId::new();
        let document = TipDocument {
            id: Some(id),
            title: tip.title,
            url: tip.url,
            description: tip.description,
            image: tip.image,
        };
        self.collection.insert_one(&document).await?;
        Ok(id.to_hex())
    }

    async fn delete_by_id(&self, id: &str) -> Result<u64> {
        let oid = parse_id(id)?;
        let result = self.collection.delete_one(doc! { "_id": oid }).await?;
        if result.deleted_count == 0 {
            return Err(AppError::internal(format!(
                "cannot delete the tip with the specified id: {id}"
            )));
        }
        Ok(result.deleted_count)
    }

    async fn scan(&self, filter: TitleFilter) -> Result<TipStream> {
        let cursor = self
            .collection
            .find(Self::filter_document(&filter))
            .await?;
        let stream = cursor.map(|item| {
            item.map_err(AppError::from)
                .and_then(TipDocument::into_tip)
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_document_empty_matches_all() {
        let doc = MongoTipStore::filter_document(&TitleFilter::all());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_filter_document_escapes_needle() {
        let doc = MongoTipStore::filter_document(&TitleFilter::new("c++ (notes)"));
        let title = doc.get_document("title").unwrap();
        let pattern = title.get_str("$regex").unwrap();
        assert_eq!(pattern, regex::escape("c++ (notes)"));
        assert_eq!(title.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_document_without_id_is_internal_error() {
        let document = TipDocument {
            id: None,
            title: "t".to_string(),
            url: "https://example.com/".to_string(),
            description: String::new(),
            image: String::new(),
        };
        assert!(matches!(
            document.into_tip(),
            Err(AppError::Internal(_))
        ));
    }
}
