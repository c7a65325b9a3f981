use std::time::Duration;

use market_logging::{market_debug, market_trace};
use marketplace_core::{Cursor, KeyEncoding};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use crate::{
    CollectionQuery, Direction, Document, FailureKind, FetchError, FilterOp,
    OrderedCollectionStore,
};

#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub base_url: Url,
    pub project_id: String,
    pub database: String,
    /// Sent as the `key` query parameter when set.
    pub api_key: Option<String>,
    /// Identity token issued by the auth provider, sent as a bearer token.
    pub id_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl FirestoreSettings {
    pub fn new(base_url: Url, project_id: impl Into<String>) -> Self {
        Self {
            base_url,
            project_id: project_id.into(),
            database: "(default)".to_string(),
            api_key: None,
            id_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        )
    }

    fn run_query_url(&self) -> Result<Url, FetchError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/v1/{}:runQuery", self.documents_root()))
            .map_err(|err| FetchError::unavailable(FailureKind::MalformedQuery, err.to_string()))?;
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

/// Firestore REST backend using `documents:runQuery`.
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    settings: FirestoreSettings,
    client: reqwest::Client,
}

impl FirestoreStore {
    pub fn new(settings: FirestoreSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::unavailable(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    /// Builds the `runQuery` request body for `query`.
    pub fn request_body(&self, query: &CollectionQuery) -> Value {
        let direction = match query.order_by.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        let op = match query.filter.op {
            FilterOp::Equal => "EQUAL",
        };

        let mut structured = json!({
            "from": [{ "collectionId": query.collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": query.filter.field },
                    "op": op,
                    "value": { "stringValue": query.filter.value },
                }
            },
            "orderBy": [
                { "field": { "fieldPath": query.order_by.field }, "direction": direction },
                { "field": { "fieldPath": "__name__" }, "direction": direction },
            ],
            "limit": query.limit,
        });

        if let Some(cursor) = &query.start_after {
            structured["startAt"] = json!({
                "values": [
                    ordering_value(cursor),
                    { "referenceValue": self.document_name(&query.collection, cursor) },
                ],
                "before": false,
            });
        }

        json!({ "structuredQuery": structured })
    }

    fn document_name(&self, collection: &str, cursor: &Cursor) -> String {
        format!(
            "{}/{}/{}",
            self.settings.documents_root(),
            collection,
            cursor.listing_id()
        )
    }
}

#[async_trait::async_trait]
impl OrderedCollectionStore for FirestoreStore {
    async fn query(&self, query: &CollectionQuery) -> Result<Vec<Document>, FetchError> {
        let url = self.settings.run_query_url()?;
        let body = self.request_body(query);
        market_trace!("runQuery {} body={}", url.path(), body);

        let mut request = self.client.post(url).json(&body);
        if let Some(token) = &self.settings.id_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            market_debug!("runQuery failed with {status}: {detail}");
            let kind = match status.as_u16() {
                400 => FailureKind::MalformedQuery,
                401 | 403 => FailureKind::PermissionDenied,
                code => FailureKind::HttpStatus(code),
            };
            return Err(FetchError::unavailable(kind, status.to_string()));
        }

        let entries: Vec<RunQueryEntry> = response.json().await.map_err(|err| {
            if err.is_timeout() {
                map_reqwest_error(err)
            } else {
                FetchError::unavailable(FailureKind::MalformedResponse, err.to_string())
            }
        })?;

        entries
            .into_iter()
            .filter_map(|entry| entry.document)
            .map(into_document)
            .collect()
    }
}

/// One element of the `runQuery` response stream. Progress-only elements
/// carry no document.
#[derive(Debug, Deserialize)]
struct RunQueryEntry {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

fn into_document(raw: FirestoreDocument) -> Result<Document, FetchError> {
    let id = raw
        .name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            FetchError::unavailable(
                FailureKind::MalformedResponse,
                format!("document name {:?} has no id", raw.name),
            )
        })?
        .to_string();

    let mut fields = Map::new();
    let mut timestamp_fields = Vec::new();
    for (key, value) in raw.fields {
        if value.get("timestampValue").is_some() {
            timestamp_fields.push(key.clone());
        }
        fields.insert(key, flatten_value(value)?);
    }
    Ok(Document {
        id,
        fields,
        timestamp_fields,
    })
}

/// Converts a typed Firestore value into plain JSON.
fn flatten_value(value: Value) -> Result<Value, FetchError> {
    let Value::Object(mut typed) = value else {
        return Err(malformed_value("expected a typed value object"));
    };
    let Some((tag, inner)) = typed.iter_mut().next().map(|(k, v)| (k.clone(), v.take())) else {
        return Err(malformed_value("empty typed value"));
    };

    match tag.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue" | "referenceValue"
        | "bytesValue" => Ok(inner),
        "integerValue" => match &inner {
            Value::String(text) => text
                .parse::<i64>()
                .map(Value::from)
                .map_err(|err| malformed_value(&format!("integerValue {text:?}: {err}"))),
            Value::Number(_) => Ok(inner),
            _ => Err(malformed_value("integerValue is not a number")),
        },
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values.clone(),
                _ => Vec::new(),
            };
            values
                .into_iter()
                .map(flatten_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "mapValue" => {
            let mut flat = Map::new();
            if let Some(Value::Object(fields)) = inner.get("fields") {
                for (key, value) in fields {
                    flat.insert(key.clone(), flatten_value(value.clone())?);
                }
            }
            Ok(Value::Object(flat))
        }
        "geoPointValue" => Ok(inner),
        other => Err(malformed_value(&format!("unsupported value type {other}"))),
    }
}

/// The cursor's ordering value, typed as the store holds it. Firestore
/// orders values of different types apart, so the type must match.
fn ordering_value(cursor: &Cursor) -> Value {
    match cursor.key_encoding() {
        KeyEncoding::Integer => json!({ "integerValue": cursor.ordering_key().to_string() }),
        KeyEncoding::Timestamp(text) => json!({ "timestampValue": text }),
        KeyEncoding::Text(text) => json!({ "stringValue": text }),
    }
}

fn malformed_value(message: &str) -> FetchError {
    FetchError::unavailable(FailureKind::MalformedResponse, message)
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::unavailable(FailureKind::Timeout, err.to_string());
    }
    FetchError::unavailable(FailureKind::Network, err.to_string())
}
