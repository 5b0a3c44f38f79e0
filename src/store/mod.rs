// src/store/mod.rs

//! Store abstractions for tip persistence.
//!
//! The tip store is a single document collection keyed by a generated
//! identifier. Two backends implement the contract: [`MongoTipStore`]
//! for production and [`MemoryTipStore`] for tests and development.
//! Both hand out identifiers in the same 24-hex string encoding, so ids
//! round-trip through [`TipStore::delete_by_id`] regardless of backend.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use futures::stream::BoxStream;
use mongodb::bson::oid::ObjectId;

use crate::error::{AppError, Result};
use crate::models::{NewTip, Tip};

// Re-export for convenience
pub use memory::MemoryTipStore;
pub use mongo::MongoTipStore;

/// Lazy, forward-only sequence of matching tips.
///
/// Iteration may fail mid-stream; an `Err` item terminates the sequence.
pub type TipStream = BoxStream<'static, Result<Tip>>;

/// Case-insensitive substring predicate against the title field.
///
/// An empty substring matches every record, which is exactly the blank
/// search code path degenerating to "all tips".
#[derive(Debug, Clone, Default)]
pub struct TitleFilter {
    needle: String,
}

impl TitleFilter {
    /// Build a filter matching titles that contain `substring`.
    pub fn new(substring: impl Into<String>) -> Self {
        Self {
            needle: substring.into().to_lowercase(),
        }
    }

    /// A filter matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// The lowercased needle, empty when the filter matches everything.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Whether the given title satisfies the filter.
    pub fn matches(&self, title: &str) -> bool {
        self.needle.is_empty() || title.to_lowercase().contains(&self.needle)
    }
}

/// Parse a caller-supplied identifier, rejecting ill-formed input before
/// any storage access.
pub fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id)
        .map_err(|_| AppError::invalid_argument(format!("cannot parse the passed-in id: {id}")))
}

/// Trait for tip storage backends.
#[async_trait]
pub trait TipStore: Send + Sync {
    /// Persist a record, assigning it a new unique identifier.
    ///
    /// Returns the assigned id in its canonical hex encoding. The record
    /// is either fully persisted or not at all.
    async fn insert(&self, tip: NewTip) -> Result<String>;

    /// Remove exactly one document by id.
    ///
    /// An ill-formed id fails with `InvalidArgument` without touching
    /// storage; a well-formed id matching zero documents fails with
    /// `Internal`. Returns the deleted count (always 1) on success.
    async fn delete_by_id(&self, id: &str) -> Result<u64>;

    /// Scan matching documents in the backend's natural order.
    async fn scan(&self, filter: TitleFilter) -> Result<TipStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_filter_case_insensitive() {
        let filter = TitleFilter::new("golang");
        assert!(filter.matches("Golang Tips"));
        assert!(filter.matches("GOLANG basics"));
        assert!(!filter.matches("Rust notes"));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = TitleFilter::new("");
        assert!(filter.matches("anything"));
        assert!(filter.matches(""));
        assert!(TitleFilter::all().matches("anything"));
    }

    #[test]
    fn test_parse_id() {
        assert!(parse_id("65a1b2c3d4e5f6a7b8c9d0e1").is_ok());
        assert!(matches!(
            parse_id("not-a-valid-id"),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
