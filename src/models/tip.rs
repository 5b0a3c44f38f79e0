//! Tip data structures.

use serde::{Deserialize, Serialize};

/// A bookmarked web page with its extracted preview metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tip {
    /// Store-assigned identifier (24-hex token), set at insertion
    pub id: String,

    /// Short human-readable label derived from the page
    pub title: String,

    /// The bookmarked link, supplied by the caller
    pub url: String,

    /// Short summary derived from the page (may be empty)
    pub description: String,

    /// URL to a representative image (empty when extraction found none)
    pub image: String,
}

/// A tip record before it has been persisted.
///
/// The store assigns the identifier at insertion; until then the record
/// carries only the caller URL and the extracted preview fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTip {
    /// Extracted title (may be empty)
    pub title: String,

    /// The bookmarked link
    pub url: String,

    /// Extracted description (may be empty)
    pub description: String,

    /// Extracted representative image URL (may be empty)
    pub image: String,
}

impl NewTip {
    /// Attach a store-assigned identifier, producing a full [`Tip`].
    pub fn with_id(self, id: impl Into<String>) -> Tip {
        Tip {
            id: id.into(),
            title: self.title,
            url: self.url,
            description: self.description,
            image: self.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_id() {
        let draft = NewTip {
            title: "Example".to_string(),
            url: "https://example.com/".to_string(),
            description: "An example page".to_string(),
            image: String::new(),
        };
        let tip = draft.with_id("65a1b2c3d4e5f6a7b8c9d0e1");
        assert_eq!(tip.id, "65a1b2c3d4e5f6a7b8c9d0e1");
        assert_eq!(tip.title, "Example");
        assert!(tip.image.is_empty());
    }
}
