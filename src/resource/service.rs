//! Service resource

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::{validate_name, validate_port};
use super::{ResourceKind, ResourceMeta, Target};
use crate::Error;

/// Default Service port
pub const DEFAULT_SERVICE_PORT: u16 = 80;

/// How a Service is exposed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    /// Cluster-internal virtual IP
    #[default]
    ClusterIP,
    /// Port on every node
    NodePort,
    /// External load balancer
    LoadBalancer,
}

impl ServiceType {
    /// Kubernetes spelling of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClusterIP => "ClusterIP",
            Self::NodePort => "NodePort",
            Self::LoadBalancer => "LoadBalancer",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ClusterIP" => Ok(Self::ClusterIP),
            "NodePort" => Ok(Self::NodePort),
            "LoadBalancer" => Ok(Self::LoadBalancer),
            other => Err(format!(
                "unknown service type '{other}' (expected ClusterIP, NodePort or LoadBalancer)"
            )),
        }
    }
}

/// Network exposure for a workload
///
/// The target port is resolved when the Service is compiled: an explicit
/// `target_port` wins, then the target workload's port, then `port`.
#[derive(Clone, Debug)]
pub struct Service {
    /// Identity and metadata
    pub meta: ResourceMeta,
    /// Workload the Service selects
    pub target: Target,
    /// Port the Service listens on
    pub port: u16,
    /// Explicit container port to forward to
    pub target_port: Option<u16>,
    /// Exposure type
    pub service_type: ServiceType,
}

impl Service {
    /// Create a ClusterIP Service on port 80
    pub fn new(name: impl Into<String>, target: impl Into<Target>) -> Self {
        Self {
            meta: ResourceMeta::new(name),
            target: target.into(),
            port: DEFAULT_SERVICE_PORT,
            target_port: None,
            service_type: ServiceType::default(),
        }
    }

    /// Set the Service port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Pin the target port instead of resolving it from the target
    pub fn with_target_port(mut self, target_port: u16) -> Self {
        self.target_port = Some(target_port);
        self
    }

    /// Set the exposure type
    pub fn with_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = service_type;
        self
    }

    /// Target port after resolution against the live target
    pub fn resolved_target_port(&self) -> u16 {
        self.target_port
            .or_else(|| self.target.port())
            .unwrap_or(self.port)
    }

    /// Check every invariant of the current field values
    pub fn validate(&self) -> crate::Result<()> {
        self.meta.validate(ResourceKind::Service)?;
        self.check()
            .map_err(|c| Error::configuration(ResourceKind::Service.as_str(), self.name(), c))
    }

    fn check(&self) -> Result<(), String> {
        validate_name("target", &self.target.name())?;
        validate_port("port", self.port)?;
        validate_port("targetPort", self.resolved_target_port())
    }
}

impl_meta_builders!(Service);
