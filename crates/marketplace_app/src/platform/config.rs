//! Application configuration, read from a RON file.
//!
//! Without an explicit path the app looks for `./marketplace.ron` and falls
//! back to defaults (an empty in-memory store) when it does not exist.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use market_logging::LogDestination;
use marketplace_core::PageSize;
use marketplace_engine::{
    CollectionLayout, Document, FetchError, FirestoreSettings, FirestoreStore, InMemoryStore,
    OrderedCollectionStore,
};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILENAME: &str = "marketplace.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("page_size must be greater than zero")]
    ZeroPageSize,
    #[error("invalid firestore base_url {url:?}: {source}")]
    BaseUrl { url: String, source: url::ParseError },
    #[error("could not load seed file {path:?}: {reason}")]
    Seed { path: PathBuf, reason: String },
    #[error("could not build store client: {0}")]
    Client(#[from] FetchError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub page_size: usize,
    pub log: LogDestination,
    pub layout: CollectionLayout,
    pub store: StoreConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::default().get(),
            log: LogDestination::default(),
            layout: CollectionLayout::default(),
            store: StoreConfig::Memory { seed: None },
        }
    }
}

impl AppConfig {
    pub fn page_size(&self) -> Result<PageSize, ConfigError> {
        PageSize::new(self.page_size).ok_or(ConfigError::ZeroPageSize)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum StoreConfig {
    /// Documents held in memory, optionally seeded from a JSON array of
    /// `{ "id": ..., "fields": {...} }` objects.
    Memory {
        #[serde(default)]
        seed: Option<PathBuf>,
    },
    Firestore {
        base_url: String,
        project_id: String,
        #[serde(default = "default_database")]
        database: String,
        #[serde(default)]
        api_key: Option<String>,
        /// Identity token sent as a bearer token; needed when security rules
        /// require a signed-in user.
        #[serde(default)]
        id_token: Option<String>,
        #[serde(default = "default_connect_timeout_ms")]
        connect_timeout_ms: u64,
        #[serde(default = "default_request_timeout_ms")]
        request_timeout_ms: u64,
    },
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// File the configuration came from; `None` when defaults were used.
    pub source: Option<PathBuf>,
}

/// Loads the configuration from `explicit`, or from the default file in the
/// working directory. Only a missing default file falls back to defaults.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILENAME);
            if !path.exists() {
                return Ok(LoadedConfig {
                    config: AppConfig::default(),
                    source: None,
                });
            }
            path
        }
    };

    let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = parse(&text).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    config.page_size()?;

    Ok(LoadedConfig {
        config,
        source: Some(path),
    })
}

pub fn parse(text: &str) -> Result<AppConfig, ron::error::SpannedError> {
    ron::from_str(text)
}

pub fn build_store(config: &AppConfig) -> Result<Arc<dyn OrderedCollectionStore>, ConfigError> {
    if let Some(settings) = firestore_settings(&config.store)? {
        return Ok(Arc::new(FirestoreStore::new(settings)?));
    }
    let documents = match &config.store {
        StoreConfig::Memory { seed: Some(path) } => load_seed(path)?,
        _ => Vec::new(),
    };
    Ok(Arc::new(InMemoryStore::with_documents(
        &config.layout.collection,
        documents,
    )))
}

/// Client settings for a Firestore store; `None` for the in-memory store.
fn firestore_settings(store: &StoreConfig) -> Result<Option<FirestoreSettings>, ConfigError> {
    let StoreConfig::Firestore {
        base_url,
        project_id,
        database,
        api_key,
        id_token,
        connect_timeout_ms,
        request_timeout_ms,
    } = store
    else {
        return Ok(None);
    };

    let url = Url::parse(base_url).map_err(|source| ConfigError::BaseUrl {
        url: base_url.clone(),
        source,
    })?;
    let mut settings = FirestoreSettings::new(url, project_id.clone());
    settings.database = database.clone();
    settings.api_key = api_key.clone();
    settings.id_token = id_token.clone();
    settings.connect_timeout = Duration::from_millis(*connect_timeout_ms);
    settings.request_timeout = Duration::from_millis(*request_timeout_ms);
    Ok(Some(settings))
}

fn load_seed(path: &Path) -> Result<Vec<Document>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|err| ConfigError::Seed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|err| ConfigError::Seed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse("()").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.page_size().unwrap().get(), 10);
    }

    #[test]
    fn parses_firestore_store() {
        let config = parse(
            r#"(
                page_size: 5,
                log: Both,
                store: Firestore(
                    base_url: "https://firestore.googleapis.com",
                    project_id: "house-market",
                    api_key: Some("abc"),
                ),
            )"#,
        )
        .unwrap();

        assert_eq!(config.page_size, 5);
        assert_eq!(config.log, LogDestination::Both);
        assert_eq!(
            config.store,
            StoreConfig::Firestore {
                base_url: "https://firestore.googleapis.com".to_string(),
                project_id: "house-market".to_string(),
                database: "(default)".to_string(),
                api_key: Some("abc".to_string()),
                id_token: None,
                connect_timeout_ms: 10_000,
                request_timeout_ms: 30_000,
            }
        );
        assert!(build_store(&config).is_ok());
    }

    #[test]
    fn firestore_settings_carry_id_token() {
        let config = parse(
            r#"(
                store: Firestore(
                    base_url: "http://localhost:8080",
                    project_id: "house-market",
                    id_token: Some("user-token"),
                    request_timeout_ms: 1500,
                ),
            )"#,
        )
        .unwrap();

        let settings = firestore_settings(&config.store)
            .unwrap()
            .expect("firestore store");
        assert_eq!(settings.id_token.as_deref(), Some("user-token"));
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.request_timeout, Duration::from_millis(1500));
        assert!(firestore_settings(&AppConfig::default().store)
            .unwrap()
            .is_none());
    }

    #[test]
    fn bad_base_url_is_reported() {
        let store = StoreConfig::Firestore {
            base_url: "not a url".to_string(),
            project_id: "p".to_string(),
            database: default_database(),
            api_key: None,
            id_token: None,
            connect_timeout_ms: 1,
            request_timeout_ms: 1,
        };
        assert!(matches!(
            firestore_settings(&store),
            Err(ConfigError::BaseUrl { .. })
        ));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("marketplace.ron");
        fs::write(&path, "(page_size: 0)").unwrap();

        let err = load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroPageSize));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = load(Some(&temp.path().join("absent.ron"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn loads_memory_store_seed() {
        let temp = TempDir::new().unwrap();
        let seed = temp.path().join("listings.json");
        fs::write(
            &seed,
            r#"[{ "id": "a", "fields": { "type": "rent", "timestamp": 1 } }]"#,
        )
        .unwrap();
        let config_path = temp.path().join("marketplace.ron");
        fs::write(
            &config_path,
            format!("(store: Memory(seed: Some({:?})))", seed.display().to_string()),
        )
        .unwrap();

        let loaded = load(Some(&config_path)).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(config_path.as_path()));
        assert!(build_store(&loaded.config).is_ok());
    }

    #[test]
    fn demo_files_parse() {
        let config = parse(include_str!("../../demo/marketplace.ron")).unwrap();
        assert_eq!(config.page_size, 3);
        assert_eq!(config.log, LogDestination::File);

        let seed: Vec<Document> =
            serde_json::from_str(include_str!("../../demo/listings.json")).unwrap();
        assert_eq!(seed.len(), 15);
    }

    #[test]
    fn bad_seed_is_reported() {
        let config = AppConfig {
            store: StoreConfig::Memory {
                seed: Some(PathBuf::from("/definitely/not/here.json")),
            },
            ..AppConfig::default()
        };
        assert!(matches!(
            build_store(&config),
            Err(ConfigError::Seed { .. })
        ));
    }
}
