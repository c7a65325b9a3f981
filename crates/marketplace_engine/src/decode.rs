use chrono::DateTime;
use marketplace_core::{Category, KeyEncoding, Listing, ListingId, ListingPayload};
use serde_json::{Map, Value};

use crate::{CollectionLayout, Document, FailureKind, FetchError};

/// Decodes a stored row into a listing.
///
/// The id, category and ordering key are required; payload fields are
/// optional and silently dropped when they have an unexpected type.
pub fn decode_listing(document: &Document, layout: &CollectionLayout) -> Result<Listing, FetchError> {
    if document.id.is_empty() {
        return Err(malformed("document without id"));
    }

    let category = document
        .fields
        .get(&layout.category_field)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            malformed(format!(
                "document {} has no {} field",
                document.id, layout.category_field
            ))
        })?
        .parse::<Category>()
        .map_err(|err| malformed(format!("document {}: {err}", document.id)))?;

    let raw_key = document.fields.get(&layout.ordering_field);
    let ordering_key = raw_key.and_then(ordering_key_of).ok_or_else(|| {
        malformed(format!(
            "document {} has no usable {} field",
            document.id, layout.ordering_field
        ))
    })?;
    let native_timestamp = document.timestamp_fields.contains(&layout.ordering_field);
    let key_encoding = match raw_key {
        Some(Value::String(text)) if native_timestamp => KeyEncoding::Timestamp(text.clone()),
        Some(Value::String(text)) => KeyEncoding::Text(text.clone()),
        _ => KeyEncoding::Integer,
    };

    Ok(Listing {
        id: ListingId::new(document.id.clone()),
        category,
        ordering_key,
        key_encoding,
        payload: decode_payload(&document.fields),
    })
}

/// Reads an ordering key: an integer count of microseconds, or an RFC 3339
/// timestamp string.
pub fn ordering_key_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|ts| ts.timestamp_micros()),
        _ => None,
    }
}

fn decode_payload(fields: &Map<String, Value>) -> ListingPayload {
    ListingPayload {
        name: string_field(fields, "name"),
        location: string_field(fields, "location"),
        regular_price: amount_field(fields, "regularPrice"),
        discounted_price: amount_field(fields, "discountedPrice"),
        offer: fields.get("offer").and_then(Value::as_bool).unwrap_or(false),
        bedrooms: count_field(fields, "bedrooms"),
        bathrooms: count_field(fields, "bathrooms"),
        image_urls: fields
            .get("imgUrls")
            .and_then(Value::as_array)
            .map(|urls| {
                urls.iter()
                    .filter_map(Value::as_str)
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
}

fn amount_field(fields: &Map<String, Value>, key: &str) -> Option<u64> {
    let value = fields.get(key)?;
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|amount| amount.is_finite() && *amount >= 0.0)
            .map(|amount| amount.round() as u64)
    })
}

fn count_field(fields: &Map<String, Value>, key: &str) -> Option<u32> {
    amount_field(fields, key).and_then(|count| u32::try_from(count).ok())
}

fn malformed(message: impl Into<String>) -> FetchError {
    FetchError::unavailable(FailureKind::MalformedResponse, message)
}
