//! Kubernetes document types produced by the manifest compiler
//!
//! These are the API-shaped documents kuber emits:
//! - Deployment / StatefulSet: container orchestration
//! - Service: network exposure
//! - ConfigMap / Secret: configuration data
//! - HorizontalPodAutoscaler: auto-scaling
//! - Namespace: only emitted when the orchestrator provisions namespaces
//!
//! Optional and empty fields are skipped on serialization so a document never
//! carries `ports: []` or `env: []`. To produce documents, use
//! [`crate::compiler::ManifestCompiler`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// =============================================================================
// Metadata
// =============================================================================

/// Standard Kubernetes ObjectMeta
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name
    pub name: String,
    /// Resource namespace
    pub namespace: String,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Create metadata with no labels or annotations
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    /// Replace all labels
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Replace all annotations
    pub fn with_annotations(mut self, annotations: BTreeMap<String, String>) -> Self {
        self.annotations = annotations;
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Label selector
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Match labels
    pub match_labels: BTreeMap<String, String>,
}

impl LabelSelector {
    /// Selector matching a single `app=<name>` label
    pub fn app(name: impl Into<String>) -> Self {
        let mut match_labels = BTreeMap::new();
        match_labels.insert(crate::LABEL_APP.to_string(), name.into());
        Self { match_labels }
    }
}

// =============================================================================
// Pod template
// =============================================================================

/// Pod template spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    /// Pod metadata
    pub metadata: PodMeta,
    /// Pod spec
    pub spec: PodSpec,
}

/// Pod metadata (subset of ObjectMeta)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodMeta {
    /// Labels
    pub labels: BTreeMap<String, String>,
}

/// Pod spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Containers
    pub containers: Vec<Container>,
}

/// Container spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name
    pub name: String,
    /// Image
    pub image: String,
    /// Ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    /// Environment variables
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    /// Resource requirements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    /// Volume mounts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

/// Environment variable
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Variable value
    pub value: String,
}

/// Container port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    /// Port number
    pub container_port: u16,
}

/// Resource requirements
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResourceRequirements {
    /// Requests
    pub requests: ResourceQuantity,
    /// Limits
    pub limits: ResourceQuantity,
}

/// CPU and memory quantities
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResourceQuantity {
    /// CPU (e.g. "100m")
    pub cpu: String,
    /// Memory (e.g. "128Mi")
    pub memory: String,
}

/// Volume mount
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Volume name
    pub name: String,
    /// Mount path
    pub mount_path: String,
}

// =============================================================================
// Deployment
// =============================================================================

/// Kubernetes Deployment
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: DeploymentSpec,
}

/// Deployment spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    /// Number of replicas
    pub replicas: i32,
    /// Label selector
    pub selector: LabelSelector,
    /// Pod template
    pub template: PodTemplateSpec,
}

// =============================================================================
// StatefulSet
// =============================================================================

/// Kubernetes StatefulSet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSet {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: StatefulSetSpec,
}

/// StatefulSet spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSetSpec {
    /// Governing service name
    pub service_name: String,
    /// Number of replicas
    pub replicas: i32,
    /// Label selector
    pub selector: LabelSelector,
    /// Pod template
    pub template: PodTemplateSpec,
    /// Claim templates, one claim per replica per template
    pub volume_claim_templates: Vec<PersistentVolumeClaimTemplate>,
}

/// PersistentVolumeClaim template embedded in a StatefulSet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimTemplate {
    /// Claim metadata (name only)
    pub metadata: ClaimMeta,
    /// Claim spec
    pub spec: PersistentVolumeClaimSpec,
}

/// Claim template metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClaimMeta {
    /// Claim name
    pub name: String,
}

/// PersistentVolumeClaim spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimSpec {
    /// Access modes (ReadWriteOnce, ...)
    pub access_modes: Vec<String>,
    /// Storage class
    pub storage_class_name: String,
    /// Storage requests
    pub resources: VolumeResources,
}

/// Volume resource requests
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VolumeResources {
    /// Requests
    pub requests: StorageRequest,
}

/// Storage request
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StorageRequest {
    /// Requested size, verbatim (e.g. "20Gi")
    pub storage: String,
}

// =============================================================================
// Service
// =============================================================================

/// Kubernetes Service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: ServiceSpec,
}

/// Service spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Selector
    pub selector: BTreeMap<String, String>,
    /// Ports
    pub ports: Vec<ServicePort>,
    /// Service type
    #[serde(rename = "type")]
    pub type_: String,
}

/// Service port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Port number
    pub port: u16,
    /// Target port
    pub target_port: u16,
    /// Protocol
    pub protocol: String,
}

// =============================================================================
// ConfigMap and Secret
// =============================================================================

/// Kubernetes ConfigMap
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Data
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Kubernetes Secret
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Secret type
    #[serde(rename = "type")]
    pub type_: String,
    /// Base64-encoded data
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

// =============================================================================
// HorizontalPodAutoscaler
// =============================================================================

/// Kubernetes HorizontalPodAutoscaler (v2)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HorizontalPodAutoscaler {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: HpaSpec,
}

/// HPA spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HpaSpec {
    /// Scale target ref
    pub scale_target_ref: ScaleTargetRef,
    /// Min replicas
    pub min_replicas: i32,
    /// Max replicas
    pub max_replicas: i32,
    /// Metrics
    pub metrics: Vec<MetricSpec>,
}

/// Scale target reference
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScaleTargetRef {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Name
    pub name: String,
}

/// Metric specification
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricSpec {
    /// Metric type
    #[serde(rename = "type")]
    pub type_: String,
    /// Resource metric
    pub resource: ResourceMetricSource,
}

/// Resource metric source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetricSource {
    /// Resource name (cpu, memory)
    pub name: String,
    /// Target
    pub target: MetricTarget,
}

/// Metric target
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricTarget {
    /// Target type
    #[serde(rename = "type")]
    pub type_: String,
    /// Average utilization percentage
    pub average_utilization: i32,
}

// =============================================================================
// Namespace
// =============================================================================

/// Kubernetes Namespace
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: NamespaceMeta,
}

/// Namespace metadata (cluster-scoped, so no namespace field)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NamespaceMeta {
    /// Namespace name
    pub name: String,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl Namespace {
    /// Create a Namespace document labelled as managed by kuber
    pub fn new(name: impl Into<String>) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert(
            crate::LABEL_MANAGED_BY.to_string(),
            crate::MANAGED_BY_KUBER.to_string(),
        );
        Self {
            api_version: "v1".to_string(),
            kind: "Namespace".to_string(),
            metadata: NamespaceMeta {
                name: name.into(),
                labels,
            },
        }
    }
}

// =============================================================================
// Manifest
// =============================================================================

/// One compiled document, ready to be rendered into a stream
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Manifest {
    /// apps/v1 Deployment
    Deployment(Deployment),
    /// v1 Service
    Service(Service),
    /// apps/v1 StatefulSet
    StatefulSet(StatefulSet),
    /// v1 ConfigMap
    ConfigMap(ConfigMap),
    /// v1 Secret
    Secret(Secret),
    /// autoscaling/v2 HorizontalPodAutoscaler
    HorizontalPodAutoscaler(HorizontalPodAutoscaler),
    /// v1 Namespace
    Namespace(Namespace),
}

impl Manifest {
    /// The document's apiVersion
    pub fn api_version(&self) -> &str {
        match self {
            Manifest::Deployment(d) => &d.api_version,
            Manifest::Service(s) => &s.api_version,
            Manifest::StatefulSet(s) => &s.api_version,
            Manifest::ConfigMap(c) => &c.api_version,
            Manifest::Secret(s) => &s.api_version,
            Manifest::HorizontalPodAutoscaler(h) => &h.api_version,
            Manifest::Namespace(n) => &n.api_version,
        }
    }

    /// The document's kind
    pub fn kind(&self) -> &str {
        match self {
            Manifest::Deployment(d) => &d.kind,
            Manifest::Service(s) => &s.kind,
            Manifest::StatefulSet(s) => &s.kind,
            Manifest::ConfigMap(c) => &c.kind,
            Manifest::Secret(s) => &s.kind,
            Manifest::HorizontalPodAutoscaler(h) => &h.kind,
            Manifest::Namespace(n) => &n.kind,
        }
    }

    /// The document's metadata.name
    pub fn name(&self) -> &str {
        match self {
            Manifest::Namespace(n) => &n.metadata.name,
            other => other.metadata().map_or("", |m| m.name.as_str()),
        }
    }

    /// The document's metadata.namespace (`None` for cluster-scoped documents)
    pub fn namespace(&self) -> Option<&str> {
        self.metadata().map(|m| m.namespace.as_str())
    }

    fn metadata(&self) -> Option<&ObjectMeta> {
        match self {
            Manifest::Deployment(d) => Some(&d.metadata),
            Manifest::Service(s) => Some(&s.metadata),
            Manifest::StatefulSet(s) => Some(&s.metadata),
            Manifest::ConfigMap(c) => Some(&c.metadata),
            Manifest::Secret(s) => Some(&s.metadata),
            Manifest::HorizontalPodAutoscaler(h) => Some(&h.metadata),
            Manifest::Namespace(_) => None,
        }
    }

    /// Serialize to a single YAML document (no leading separator)
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::serialization_for_kind(self.kind(), e.to_string()))
    }

    /// Convert to a generic JSON value for inspection
    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| Error::serialization_for_kind(self.kind(), e.to_string()))
    }
}
