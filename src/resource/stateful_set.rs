//! StatefulSet resource

use indexmap::IndexMap;

use super::validation::{
    validate_key, validate_name, validate_port, validate_quantity, validate_replicas,
};
use super::{ResourceKind, ResourceMeta};
use crate::Error;

/// Default persistent volume size per replica
pub const DEFAULT_STORAGE: &str = "10Gi";

/// Default storage class
pub const DEFAULT_STORAGE_CLASS: &str = "standard";

/// A stateful workload with one persistent volume claim per replica
#[derive(Clone, Debug, PartialEq)]
pub struct StatefulSet {
    /// Identity and metadata
    pub meta: ResourceMeta,
    /// Container image reference
    pub image: String,
    /// Desired replica count
    pub replicas: i32,
    /// Container port, if the workload listens on one
    pub port: Option<u16>,
    /// Volume size per replica, kept verbatim (e.g. "20Gi")
    pub storage: String,
    /// Storage class of the claim template
    pub storage_class: String,
    /// Container environment
    pub env: IndexMap<String, String>,
}

impl StatefulSet {
    /// Create a single-replica StatefulSet with 10Gi of standard storage
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            meta: ResourceMeta::new(name),
            image: image.into(),
            replicas: 1,
            port: None,
            storage: DEFAULT_STORAGE.to_string(),
            storage_class: DEFAULT_STORAGE_CLASS.to_string(),
            env: IndexMap::new(),
        }
    }

    /// Set the replica count
    pub fn with_replicas(mut self, replicas: i32) -> Self {
        self.replicas = replicas;
        self
    }

    /// Set the container port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the volume size per replica
    pub fn with_storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = storage.into();
        self
    }

    /// Set the storage class
    pub fn with_storage_class(mut self, storage_class: impl Into<String>) -> Self {
        self.storage_class = storage_class.into();
        self
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Name of the volume claim template shared by all replicas
    pub fn claim_name(&self) -> String {
        format!("{}-storage", self.name())
    }

    /// Check every invariant of the current field values
    pub fn validate(&self) -> crate::Result<()> {
        self.meta.validate(ResourceKind::StatefulSet)?;
        self.check()
            .map_err(|c| Error::configuration(ResourceKind::StatefulSet.as_str(), self.name(), c))
    }

    fn check(&self) -> Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("image must not be empty".to_string());
        }
        validate_replicas("replicas", self.replicas)?;
        if let Some(port) = self.port {
            validate_port("port", port)?;
        }
        validate_quantity("storage", &self.storage)?;
        validate_name("storage class", &self.storage_class)?;
        for key in self.env.keys() {
            validate_key("env var name", key)?;
        }
        Ok(())
    }
}

impl_meta_builders!(StatefulSet);
