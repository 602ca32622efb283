
use crate::{
    config::StoreLocation,
    library::{Category, Character, ImportMode},
};
use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

pub const CATEGORY_LIST_KEY: &str = "quickspawn_categorylist";
pub const CHARACTER_LIST_KEY: &str = "quickspawn_characterlist";
pub const IMPORT_MODE_KEY: &str = "quickspawn_import_mode";

pub type StoreDocument = Map<String, Value>;

#[derive(Debug, Clone)]
pub struct CacheService {
    path: PathBuf,
}

impl CacheService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn at(location: &StoreLocation) -> Self {
        Self::new(location.store_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> StoreDocument {
        match self.try_read() {
            Ok(document) => document,
            Err(err) => {
                debug!(path = %self.path.display(), "store unreadable, using empty document: {err:#}");
                Map::new()
            }
        }
    }

    fn try_read(&self) -> Result<StoreDocument> {
        let raw = fs::read_to_string(&self.path).context("read quickspawn store")?;
        let value: Value = serde_json::from_str(&raw).context("parse quickspawn store")?;
        match value {
            Value::Object(document) => Ok(document),
            _ => bail!("quickspawn store root is not an object"),
        }
    }

    pub fn write(&self, document: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("create quickspawn config dir")?;
        }
        let raw = serde_json::to_string_pretty(document).context("serialize quickspawn store")?;
        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, raw).context("write quickspawn store temp")?;
        if let Err(err) = fs::rename(&temp, &self.path) {
            // Never drop the previous store; only the temp copy goes.
            let _ = fs::remove_file(&temp);
            return Err(err).context("finalize quickspawn store");
        }
        debug!(path = %self.path.display(), "wrote quickspawn store");
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<bool> {
        if !self.read().is_empty() {
            return Ok(false);
        }
        self.write(&empty_lists())?;
        Ok(true)
    }

    pub fn get_categories(&self) -> Vec<Category> {
        decode_list(&self.read(), CATEGORY_LIST_KEY)
    }

    pub fn get_characters(&self) -> Vec<Character> {
        decode_list::<Character>(&self.read(), CHARACTER_LIST_KEY)
            .into_iter()
            .map(|mut character| {
                if character.name.is_empty() {
                    character.name = character.collection.clone();
                }
                character
            })
            .collect()
    }

    pub fn get_import_mode(&self) -> ImportMode {
        match self.read().get(IMPORT_MODE_KEY) {
            Some(Value::String(raw)) => ImportMode::parse(raw).unwrap_or_else(|| {
                warn!(value = %raw, "unknown import mode in store, using APPEND");
                ImportMode::default()
            }),
            _ => ImportMode::default(),
        }
    }

    pub fn save_categories(&self, categories: &[Category]) -> Result<()> {
        self.save_key(CATEGORY_LIST_KEY, categories)
    }

    pub fn save_characters(&self, characters: &[Character]) -> Result<()> {
        self.save_key(CHARACTER_LIST_KEY, characters)
    }

    pub fn save_import_mode(&self, mode: ImportMode) -> Result<()> {
        self.save_key(IMPORT_MODE_KEY, &mode)
    }

    pub fn clear_lists(&self) -> Result<()> {
        let mut document = self.read();
        document.extend(empty_lists());
        self.write(&document)
    }

    fn save_key<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).with_context(|| format!("serialize {key}"))?;
        let mut document = self.read();
        document.insert(key.to_string(), value);
        self.write(&document)
    }
}

fn empty_lists() -> StoreDocument {
    let mut document = Map::new();
    document.insert(CATEGORY_LIST_KEY.to_string(), Value::Array(Vec::new()));
    document.insert(CHARACTER_LIST_KEY.to_string(), Value::Array(Vec::new()));
    document
}

fn decode_list<T: DeserializeOwned>(document: &StoreDocument, key: &str) -> Vec<T> {
    let items = match document.get(key) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!(key, "store entry is not a list, ignoring it");
            return Vec::new();
        }
        None => return Vec::new(),
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(key, index, "skipping malformed store record: {err}");
                None
            }
        })
        .collect()
}
