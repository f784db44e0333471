// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for retrace tools.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
    /// Where `key` lives, for display (a path, a table name, ...).
    fn locate(&self, key: &str) -> String;
}

/// A config value with a fixed storage key.
pub trait Stored: Serialize + DeserializeOwned + Default {
    /// Logical key the value is stored under.
    const KEY: &'static str;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("config key not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("config format error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The backing store could not be set up.
    #[error("config store unavailable: {0}")]
    Unavailable(String),
}

/// Serializes config values as JSON and delegates storage to a `ConfigStore`.
#[derive(Debug)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the inner store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize the value at `key`. `Ok(None)` if missing or empty.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist `value` at `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Load a [`Stored`] value, falling back to its default when missing.
    pub fn load_stored<T: Stored>(&self) -> Result<T, ConfigError> {
        self.load(T::KEY).map(Option::unwrap_or_default)
    }

    /// Persist a [`Stored`] value under its key.
    pub fn save_stored<T: Stored>(&self, value: &T) -> Result<(), ConfigError> {
        self.save(T::KEY, value)
    }

    /// Display location of a [`Stored`] value.
    pub fn locate_stored<T: Stored>(&self) -> String {
        self.store.locate(T::KEY)
    }
}
