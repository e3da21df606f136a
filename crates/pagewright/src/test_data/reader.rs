//! Fixture loading by dotted resource name and `TestDataId`.

use super::placeholders::PlaceholderEngine;
use crate::config::FrameworkConfig;
use crate::result::{PagewrightError, PagewrightResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Folder prefix of every test-data resource
pub const TEST_DATA_FOLDER: &str = "TestData";

/// Key that identifies a record inside a fixture
pub const TEST_DATA_ID: &str = "TestDataId";

// =============================================================================
// Resource stores
// =============================================================================

/// Where fixtures come from
pub trait ResourceStore: Send + Sync + fmt::Debug {
    /// Raw contents of resource `name`
    fn load(&self, name: &str) -> PagewrightResult<Vec<u8>>;

    fn exists(&self, name: &str) -> bool;
}

/// Resources on disk below a root directory.
///
/// `TestData.users.json` is looked up as the literal file
/// `TestData.users.json` first, then as `TestData/users.json`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the configured `test_data_dir`
    #[must_use]
    pub fn from_config(config: &FrameworkConfig) -> Self {
        Self::new(config.test_data_dir.clone())
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `name`, if any
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let literal = self.root.join(name);
        if literal.is_file() {
            return Some(literal);
        }
        let nested = match name.rsplit_once('.') {
            Some((stem, ext)) => format!("{}.{ext}", stem.replace('.', "/")),
            None => name.replace('.', "/"),
        };
        let nested = self.root.join(nested);
        nested.is_file().then_some(nested)
    }
}

impl ResourceStore for DirectoryStore {
    fn load(&self, name: &str) -> PagewrightResult<Vec<u8>> {
        let Some(path) = self.resolve(name) else {
            return Err(PagewrightError::ResourceMissing {
                name: name.to_string(),
            });
        };
        debug!(resource = name, path = %path.display(), "Loading resource");
        Ok(std::fs::read(path)?)
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

/// Resources compiled into the test binary
#[derive(Debug, Clone, Default)]
pub struct EmbeddedStore {
    resources: HashMap<String, Cow<'static, [u8]>>,
}

impl EmbeddedStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text resource, typically from `include_str!`
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, text: &'static str) -> Self {
        self.resources
            .insert(name.into(), Cow::Borrowed(text.as_bytes()));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.resources.insert(name.into(), Cow::Owned(bytes));
    }

    /// Resource names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ResourceStore for EmbeddedStore {
    fn load(&self, name: &str) -> PagewrightResult<Vec<u8>> {
        self.resources
            .get(name)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| PagewrightError::ResourceMissing {
                name: name.to_string(),
            })
    }

    fn exists(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }
}

// =============================================================================
// Records
// =============================================================================

/// A record with its `TestDataId`, which is read but never written back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDataRecord<T> {
    #[serde(rename = "TestDataId", default, skip_serializing)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

fn id_matches(record: &Value, id: &str) -> bool {
    match record.get(TEST_DATA_ID) {
        Some(Value::String(value)) => value == id,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == id,
    }
}

/// Every object carrying `TestDataId == id`, outer objects before nested ones
fn collect_records<'a>(value: &'a Value, id: &str, found: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if id_matches(value, id) {
                found.push(value);
            }
            for child in map.values() {
                collect_records(child, id, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_records(item, id, found);
            }
        }
        _ => {}
    }
}

// =============================================================================
// Readers
// =============================================================================

/// JSON fixtures with placeholder substitution
#[derive(Debug)]
pub struct JsonTestDataReader<S> {
    store: S,
    engine: PlaceholderEngine,
}

impl<S: ResourceStore> JsonTestDataReader<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            engine: PlaceholderEngine::new(),
        }
    }

    /// Use a custom (seeded, fixed-clock) engine
    #[must_use]
    pub fn with_engine(mut self, engine: PlaceholderEngine) -> Self {
        self.engine = engine;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn engine(&self) -> &PlaceholderEngine {
        &self.engine
    }

    /// Resource name of fixture `file`
    #[must_use]
    pub fn resource_name(file: &str) -> String {
        format!("{TEST_DATA_FOLDER}.{file}.json")
    }

    /// Fixture `file` with placeholders expanded
    pub fn document(&self, file: &str) -> PagewrightResult<Value> {
        let bytes = self.store.load(&Self::resource_name(file))?;
        let text = String::from_utf8_lossy(&bytes);
        let expanded = self.engine.replace_tokens(&text);
        Ok(serde_json::from_str(&expanded)?)
    }

    /// The single record with `TestDataId == id`
    pub fn read<T: DeserializeOwned>(&self, file: &str, id: &str) -> PagewrightResult<T> {
        let document = self.document(file)?;
        let mut found = Vec::new();
        collect_records(&document, id, &mut found);
        match found.as_slice() {
            [record] => Ok(T::deserialize(*record)?),
            [] => Err(PagewrightError::TestDataNotFound {
                file: Self::resource_name(file),
                id: id.to_string(),
            }),
            records => Err(PagewrightError::TestDataNotUnique {
                file: Self::resource_name(file),
                id: id.to_string(),
                count: records.len(),
            }),
        }
    }

    /// All records for each id, in id order
    pub fn read_many<T: DeserializeOwned>(
        &self,
        file: &str,
        ids: &[&str],
    ) -> PagewrightResult<Vec<T>> {
        let document = self.document(file)?;
        let mut found = Vec::new();
        for id in ids {
            collect_records(&document, id, &mut found);
        }
        debug!(file, records = found.len(), "Test data records read");
        found
            .into_iter()
            .map(|record| T::deserialize(record).map_err(PagewrightError::from))
            .collect()
    }
}

/// Raw fixture files (`TestData.{file}`)
#[derive(Debug, Clone)]
pub struct FilesTestDataReader<S> {
    store: S,
}

impl<S: ResourceStore> FilesTestDataReader<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub fn read(&self, file: &str) -> PagewrightResult<Vec<u8>> {
        self.store.load(&format!("{TEST_DATA_FOLDER}.{file}"))
    }

    pub fn read_to_string(&self, file: &str) -> PagewrightResult<String> {
        let bytes = self.read(file)?;
        String::from_utf8(bytes)
            .map_err(|e| PagewrightError::invalid_argument(format!("{file} is not UTF-8: {e}")))
    }
}
