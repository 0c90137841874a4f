//! ConfigMap and Secret resources

use std::collections::BTreeMap;

use super::validation::validate_key;
use super::{ResourceKind, ResourceMeta};
use crate::Error;

/// Default Secret type
pub const DEFAULT_SECRET_TYPE: &str = "Opaque";

/// Plain configuration data
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigMap {
    /// Identity and metadata
    pub meta: ResourceMeta,
    /// Key-value data, emitted as-is
    pub data: BTreeMap<String, String>,
}

impl ConfigMap {
    /// Create an empty ConfigMap
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: ResourceMeta::new(name),
            data: BTreeMap::new(),
        }
    }

    /// Add or overwrite one entry
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Replace all data
    pub fn with_data(mut self, data: BTreeMap<String, String>) -> Self {
        self.data = data;
        self
    }

    /// Check every invariant of the current field values
    pub fn validate(&self) -> crate::Result<()> {
        self.meta.validate(ResourceKind::ConfigMap)?;
        check_keys(&self.data)
            .map_err(|c| Error::configuration(ResourceKind::ConfigMap.as_str(), self.name(), c))
    }
}

impl_meta_builders!(ConfigMap);

/// Sensitive data
///
/// Values are held in plaintext and only base64-encoded when compiled.
#[derive(Clone, PartialEq)]
pub struct Secret {
    /// Identity and metadata
    pub meta: ResourceMeta,
    /// Plaintext key-value data
    pub data: BTreeMap<String, String>,
    /// Secret type (e.g. "Opaque", "kubernetes.io/tls")
    pub secret_type: String,
}

impl Secret {
    /// Create an empty Opaque Secret
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: ResourceMeta::new(name),
            data: BTreeMap::new(),
            secret_type: DEFAULT_SECRET_TYPE.to_string(),
        }
    }

    /// Add or overwrite one entry
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Replace all data
    pub fn with_data(mut self, data: BTreeMap<String, String>) -> Self {
        self.data = data;
        self
    }

    /// Set the Secret type
    pub fn with_type(mut self, secret_type: impl Into<String>) -> Self {
        self.secret_type = secret_type.into();
        self
    }

    /// Check every invariant of the current field values
    pub fn validate(&self) -> crate::Result<()> {
        self.meta.validate(ResourceKind::Secret)?;
        let check = || {
            if self.secret_type.trim().is_empty() {
                return Err("type must not be empty".to_string());
            }
            check_keys(&self.data)
        };
        check().map_err(|c| Error::configuration(ResourceKind::Secret.as_str(), self.name(), c))
    }
}

// Keep plaintext values out of logs and panic messages.
impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("meta", &self.meta)
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .field("secret_type", &self.secret_type)
            .finish()
    }
}

impl_meta_builders!(Secret);

fn check_keys(data: &BTreeMap<String, String>) -> Result<(), String> {
    data.keys().try_for_each(|key| validate_key("data key", key))
}
