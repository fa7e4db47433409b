//! Configuration values visible to every lifecycle hook.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

/// String key/value configuration, cheap to clone.
///
/// The kernel hands it to every hook through the phase contexts and also
/// registers it in the service container.
#[derive(Clone, Default, Debug)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every environment variable of the process.
    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    /// Environment variables starting with `prefix`, with the prefix stripped.
    ///
    /// `with_prefix_from_env("APP_")` turns `APP_PORT=8080` into `PORT`.
    pub fn with_prefix_from_env(prefix: &str) -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(prefix) {
                service.set(stripped, &value);
            }
        }
        service
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let service = Self::default();
        for (key, value) in pairs {
            service.set(key.as_ref(), value.as_ref());
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a value with [`FromStr`].
    pub fn get_parsed<T>(&self, key: &str) -> Option<anyhow::Result<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.get(key).map(|raw| {
            raw.parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid value for '{}': {}", key, e))
        })
    }

    /// Parse a value holding JSON.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<anyhow::Result<T>> {
        self.get(key).map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("invalid JSON for '{}': {}", key, e))
        })
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.config.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.config.len()
    }

    pub fn is_empty(&self) -> bool {
        self.config.is_empty()
    }
}
