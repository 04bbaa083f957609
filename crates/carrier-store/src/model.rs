//! Carrier record types.

use crate::error::{CarrierError, CarrierResult};
use crate::pagination;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Store-assigned carrier identifier.
///
/// Opaque: the table may key rows by UUID or by bigint, so both JSON
/// strings and JSON numbers are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CarrierId(String);

impl CarrierId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CarrierId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for CarrierId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => CarrierId(s),
            RawId::Number(n) => CarrierId(n.to_string()),
        })
    }
}

/// A shipping-provider record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub id: CarrierId,
    pub name: String,
}

/// Writable fields of a carrier, used for both create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierFields {
    pub name: String,
}

impl CarrierFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Client-side required-field check. Whitespace-only names count as empty.
    pub fn validate(&self) -> CarrierResult<()> {
        if self.name.trim().is_empty() {
            return Err(CarrierError::EmptyField { field: "name" });
        }
        Ok(())
    }
}

impl From<&Carrier> for CarrierFields {
    fn from(carrier: &Carrier) -> Self {
        Self {
            name: carrier.name.clone(),
        }
    }
}

/// One slice of the name-ordered collection plus the exact total row count.
///
/// Derived on every fetch, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub items: Vec<Carrier>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    /// `ceil(total / page_size)`; zero for an empty collection.
    pub fn total_pages(&self) -> u32 {
        pagination::total_pages(self.total, self.page_size)
    }

    /// True when the whole collection is empty, not just this slice.
    pub fn is_empty_collection(&self) -> bool {
        self.total == 0
    }
}
