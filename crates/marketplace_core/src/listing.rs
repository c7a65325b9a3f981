use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Listing category. A listing never changes category once stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Sale,
    Rent,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Sale, Category::Rent];

    /// Value stored in the category field of a listing document.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Sale => "sale",
            Category::Rent => "rent",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown listing category {0:?}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sale" => Ok(Category::Sale),
            "rent" => Ok(Category::Rent),
            _ => Err(ParseCategoryError(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attributes shown for a listing. Never inspected by pagination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingPayload {
    pub name: Option<String>,
    pub location: Option<String>,
    pub regular_price: Option<u64>,
    pub discounted_price: Option<u64>,
    pub offer: bool,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub image_urls: Vec<String>,
}

/// How the store holds a listing's ordering value. A store resuming after a
/// listing must compare against a value of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum KeyEncoding {
    /// Integer count of microseconds.
    #[default]
    Integer,
    /// Native timestamp; keeps the stored RFC 3339 text.
    Timestamp(String),
    /// Plain string holding an RFC 3339 timestamp, kept verbatim.
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: ListingId,
    pub category: Category,
    /// Creation time in microseconds since the Unix epoch; the sort key.
    pub ordering_key: i64,
    pub key_encoding: KeyEncoding,
    pub payload: ListingPayload,
}

impl Listing {
    /// Returns true when `self` sorts strictly after `cursor` in the
    /// descending (ordering key, id) order, i.e. it belongs to a later page.
    pub fn is_after(&self, cursor: &Cursor) -> bool {
        (self.ordering_key, &self.id) < (cursor.ordering_key, &cursor.id)
    }
}

/// Continuation token: "resume just after this listing".
///
/// Carries the ordering key and the identifier of the last listing of a
/// page, so listings sharing a timestamp are split by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    ordering_key: i64,
    key_encoding: KeyEncoding,
    id: ListingId,
}

impl Cursor {
    pub fn after(listing: &Listing) -> Self {
        Self {
            ordering_key: listing.ordering_key,
            key_encoding: listing.key_encoding.clone(),
            id: listing.id.clone(),
        }
    }

    pub fn ordering_key(&self) -> i64 {
        self.ordering_key
    }

    pub fn key_encoding(&self) -> &KeyEncoding {
        &self.key_encoding
    }

    pub fn listing_id(&self) -> &ListingId {
        &self.id
    }
}
