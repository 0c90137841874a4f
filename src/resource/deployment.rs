//! Deployment resource

use indexmap::IndexMap;

use super::validation::{validate_key, validate_port, validate_quantity, validate_replicas};
use super::{ResourceKind, ResourceMeta};
use crate::Error;

/// CPU and memory requests and limits for a workload's container
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputeResources {
    /// CPU request (e.g. "100m")
    pub cpu_request: String,
    /// Memory request (e.g. "128Mi")
    pub memory_request: String,
    /// CPU limit (e.g. "500m")
    pub cpu_limit: String,
    /// Memory limit (e.g. "512Mi")
    pub memory_limit: String,
}

impl Default for ComputeResources {
    fn default() -> Self {
        Self {
            cpu_request: "100m".to_string(),
            memory_request: "128Mi".to_string(),
            cpu_limit: "500m".to_string(),
            memory_limit: "512Mi".to_string(),
        }
    }
}

impl ComputeResources {
    pub(crate) fn validate(&self) -> Result<(), String> {
        validate_quantity("cpu request", &self.cpu_request)?;
        validate_quantity("memory request", &self.memory_request)?;
        validate_quantity("cpu limit", &self.cpu_limit)?;
        validate_quantity("memory limit", &self.memory_limit)
    }
}

/// A stateless workload: one container image run as N replicas
#[derive(Clone, Debug, PartialEq)]
pub struct Deployment {
    /// Identity and metadata
    pub meta: ResourceMeta,
    /// Container image reference
    pub image: String,
    /// Desired replica count
    pub replicas: i32,
    /// Container port, if the workload listens on one
    pub port: Option<u16>,
    /// Container environment
    pub env: IndexMap<String, String>,
    /// Requests and limits
    pub resources: ComputeResources,
    /// Emit the `auto-heal: "true"` label
    pub auto_heal: bool,
}

impl Deployment {
    /// Create a Deployment with one replica, no port and default resources
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            meta: ResourceMeta::new(name),
            image: image.into(),
            replicas: 1,
            port: None,
            env: IndexMap::new(),
            resources: ComputeResources::default(),
            auto_heal: true,
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

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Replace requests and limits
    pub fn with_resources(mut self, resources: ComputeResources) -> Self {
        self.resources = resources;
        self
    }

    /// Toggle the auto-heal label
    pub fn with_auto_heal(mut self, auto_heal: bool) -> Self {
        self.auto_heal = auto_heal;
        self
    }

    /// Check every invariant of the current field values
    pub fn validate(&self) -> crate::Result<()> {
        self.meta.validate(ResourceKind::Deployment)?;
        self.check()
            .map_err(|c| Error::configuration(ResourceKind::Deployment.as_str(), self.name(), c))
    }

    fn check(&self) -> Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("image must not be empty".to_string());
        }
        validate_replicas("replicas", self.replicas)?;
        if let Some(port) = self.port {
            validate_port("port", port)?;
        }
        for key in self.env.keys() {
            validate_key("env var name", key)?;
        }
        self.resources.validate()
    }
}

impl_meta_builders!(Deployment);
