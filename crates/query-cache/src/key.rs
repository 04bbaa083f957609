//! Cache keys.

use std::fmt;

/// What part of a collection a cached query covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyScope {
    /// One page of the ordered listing.
    Page { page: u32, page_size: u32 },
    /// The unpaged ordered listing.
    All,
    /// A single record by id.
    Record(String),
}

/// Identifies one cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    collection: String,
    scope: KeyScope,
}

impl QueryKey {
    pub fn page(collection: impl Into<String>, page: u32, page_size: u32) -> Self {
        Self {
            collection: collection.into(),
            scope: KeyScope::Page { page, page_size },
        }
    }

    pub fn all(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            scope: KeyScope::All,
        }
    }

    pub fn record(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            scope: KeyScope::Record(id.into()),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn scope(&self) -> &KeyScope {
        &self.scope
    }

    /// List-type keys are the ones a collection-wide invalidation reaches.
    pub fn is_listing(&self) -> bool {
        matches!(self.scope, KeyScope::Page { .. } | KeyScope::All)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            KeyScope::Page { page, page_size } => {
                write!(f, "{}[page={page},size={page_size}]", self.collection)
            }
            KeyScope::All => write!(f, "{}[all]", self.collection),
            KeyScope::Record(id) => write!(f, "{}[id={id}]", self.collection),
        }
    }
}
