//! Resource model: typed declarative intent for each supported kind
//!
//! Resources are plain data holders with sensible defaults. They are held
//! through [`Shared`] handles so the caller can keep mutating a resource after
//! handing it to a graph or referencing it from a Service/HPA; compilation
//! always reads the live value.
//!
//! ```rust,ignore
//! let web = Deployment::new("web", "nginx:1.27").with_port(8080).shared();
//! let svc = Service::new("web-service", &web);
//! web.write().port = Some(9090); // svc now compiles with targetPort 9090
//! ```

// Defined before the submodules so they can invoke it.
/// Implements the metadata builder methods every resource shares.
macro_rules! impl_meta_builders {
    ($ty:ty) => {
        impl $ty {
            /// Resource name
            pub fn name(&self) -> &str {
                self.meta.name()
            }

            /// Set the namespace
            pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
                self.meta.namespace = namespace.into();
                self
            }

            /// Replace the default labels (an empty map keeps the defaults)
            pub fn with_labels(
                mut self,
                labels: std::collections::BTreeMap<String, String>,
            ) -> Self {
                self.meta.set_labels(labels);
                self
            }

            /// Add or overwrite a single label
            pub fn with_label(
                mut self,
                key: impl Into<String>,
                value: impl Into<String>,
            ) -> Self {
                self.meta.labels.insert(key.into(), value.into());
                self
            }

            /// Add or overwrite an annotation
            pub fn with_annotation(
                mut self,
                key: impl Into<String>,
                value: impl Into<String>,
            ) -> Self {
                self.meta.annotations.insert(key.into(), value.into());
                self
            }

            /// Move into a shared handle
            pub fn shared(self) -> $crate::resource::Shared<Self> {
                $crate::resource::Shared::new(self)
            }
        }
    };
}

mod autoscaler;
mod config;
mod deployment;
mod service;
mod stateful_set;
pub mod validation;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use autoscaler::{HorizontalPodAutoscaler, DEFAULT_CPU_PERCENT};
pub use config::{ConfigMap, Secret, DEFAULT_SECRET_TYPE};
pub use deployment::{ComputeResources, Deployment};
pub use service::{Service, ServiceType, DEFAULT_SERVICE_PORT};
pub use stateful_set::{StatefulSet, DEFAULT_STORAGE, DEFAULT_STORAGE_CLASS};

use crate::{Error, DEFAULT_NAMESPACE, LABEL_APP, LABEL_MANAGED_BY, MANAGED_BY_KUBER};

// =============================================================================
// Shared handle
// =============================================================================

/// Shared, mutable handle to a resource
///
/// Cloning the handle shares the resource. Use [`Shared::write`] to change
/// fields before compilation.
#[derive(Debug, Default)]
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    /// Wrap a value in a new handle
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Borrow the current value
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    /// Borrow the value mutably
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    /// Whether two handles point at the same resource
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> From<T> for Shared<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

// =============================================================================
// Common metadata
// =============================================================================

/// Identity and metadata common to every resource
///
/// The name is fixed at construction; namespace, labels and annotations may
/// change until compilation.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceMeta {
    name: String,
    /// Target namespace
    pub namespace: String,
    /// Labels
    pub labels: BTreeMap<String, String>,
    /// Annotations
    pub annotations: BTreeMap<String, String>,
}

impl ResourceMeta {
    /// Create metadata in the default namespace with the default labels
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            labels: default_labels(&name),
            name,
            namespace: DEFAULT_NAMESPACE.to_string(),
            annotations: BTreeMap::new(),
        }
    }

    /// Resource name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the labels wholesale
    ///
    /// An empty map restores the default `{app, managed-by}` labels.
    pub fn set_labels(&mut self, labels: BTreeMap<String, String>) {
        self.labels = if labels.is_empty() {
            default_labels(&self.name)
        } else {
            labels
        };
    }

    /// Check name and namespace
    pub(crate) fn validate(&self, kind: ResourceKind) -> crate::Result<()> {
        validation::validate_name("name", &self.name)
            .and_then(|_| validation::validate_namespace(&self.namespace))
            .map_err(|constraint| Error::configuration(kind.as_str(), &self.name, constraint))
    }
}

/// Default labels applied when the caller supplies none
pub fn default_labels(name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(LABEL_APP.to_string(), name.to_string());
    labels.insert(LABEL_MANAGED_BY.to_string(), MANAGED_BY_KUBER.to_string());
    labels
}

// =============================================================================
// Kinds
// =============================================================================

/// Kind tag of a resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// apps/v1 Deployment
    Deployment,
    /// v1 Service
    Service,
    /// apps/v1 StatefulSet
    StatefulSet,
    /// v1 ConfigMap
    ConfigMap,
    /// v1 Secret
    Secret,
    /// autoscaling/v2 HorizontalPodAutoscaler
    HorizontalPodAutoscaler,
}

impl ResourceKind {
    /// Kubernetes kind string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "Deployment",
            Self::Service => "Service",
            Self::StatefulSet => "StatefulSet",
            Self::ConfigMap => "ConfigMap",
            Self::Secret => "Secret",
            Self::HorizontalPodAutoscaler => "HorizontalPodAutoscaler",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any supported resource, held by shared handle
#[derive(Clone, Debug)]
pub enum Resource {
    /// Deployment
    Deployment(Shared<Deployment>),
    /// Service
    Service(Shared<Service>),
    /// StatefulSet
    StatefulSet(Shared<StatefulSet>),
    /// ConfigMap
    ConfigMap(Shared<ConfigMap>),
    /// Secret
    Secret(Shared<Secret>),
    /// HorizontalPodAutoscaler
    HorizontalPodAutoscaler(Shared<HorizontalPodAutoscaler>),
}

impl Resource {
    /// Kind tag
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Deployment(_) => ResourceKind::Deployment,
            Resource::Service(_) => ResourceKind::Service,
            Resource::StatefulSet(_) => ResourceKind::StatefulSet,
            Resource::ConfigMap(_) => ResourceKind::ConfigMap,
            Resource::Secret(_) => ResourceKind::Secret,
            Resource::HorizontalPodAutoscaler(_) => ResourceKind::HorizontalPodAutoscaler,
        }
    }

    /// Current name
    pub fn name(&self) -> String {
        self.with_meta(|m| m.name().to_string())
    }

    /// Current namespace
    pub fn namespace(&self) -> String {
        self.with_meta(|m| m.namespace.clone())
    }

    fn with_meta<R>(&self, f: impl FnOnce(&ResourceMeta) -> R) -> R {
        match self {
            Resource::Deployment(r) => f(&r.read().meta),
            Resource::Service(r) => f(&r.read().meta),
            Resource::StatefulSet(r) => f(&r.read().meta),
            Resource::ConfigMap(r) => f(&r.read().meta),
            Resource::Secret(r) => f(&r.read().meta),
            Resource::HorizontalPodAutoscaler(r) => f(&r.read().meta),
        }
    }
}

macro_rules! impl_into_resource {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<Shared<$variant>> for Resource {
                fn from(handle: Shared<$variant>) -> Self {
                    Resource::$variant(handle)
                }
            }

            impl From<&Shared<$variant>> for Resource {
                fn from(handle: &Shared<$variant>) -> Self {
                    Resource::$variant(handle.clone())
                }
            }

            impl From<$variant> for Resource {
                fn from(value: $variant) -> Self {
                    Resource::$variant(Shared::new(value))
                }
            }
        )*
    };
}

impl_into_resource!(
    Deployment,
    Service,
    StatefulSet,
    ConfigMap,
    Secret,
    HorizontalPodAutoscaler,
);

// =============================================================================
// Target references
// =============================================================================

/// What a Service or HPA points at: a workload object or a raw name
#[derive(Clone, Debug)]
pub enum Target {
    /// A Deployment, resolved at compile time
    Deployment(Shared<Deployment>),
    /// A StatefulSet, resolved at compile time
    StatefulSet(Shared<StatefulSet>),
    /// A workload known only by name
    Name(String),
}

impl Target {
    /// Name of the referenced workload
    pub fn name(&self) -> String {
        match self {
            Target::Deployment(d) => d.read().name().to_string(),
            Target::StatefulSet(s) => s.read().name().to_string(),
            Target::Name(name) => name.clone(),
        }
    }

    /// Container port of the referenced workload, if known
    pub fn port(&self) -> Option<u16> {
        match self {
            Target::Deployment(d) => d.read().port,
            Target::StatefulSet(s) => s.read().port,
            Target::Name(_) => None,
        }
    }

    /// Namespace of the referenced workload, if known
    pub fn namespace(&self) -> Option<String> {
        match self {
            Target::Deployment(d) => Some(d.read().meta.namespace.clone()),
            Target::StatefulSet(s) => Some(s.read().meta.namespace.clone()),
            Target::Name(_) => None,
        }
    }

    /// Workload kind (raw names are assumed to be Deployments)
    pub fn kind(&self) -> ResourceKind {
        match self {
            Target::StatefulSet(_) => ResourceKind::StatefulSet,
            Target::Deployment(_) | Target::Name(_) => ResourceKind::Deployment,
        }
    }
}

impl From<&Shared<Deployment>> for Target {
    fn from(handle: &Shared<Deployment>) -> Self {
        Target::Deployment(handle.clone())
    }
}

impl From<Shared<Deployment>> for Target {
    fn from(handle: Shared<Deployment>) -> Self {
        Target::Deployment(handle)
    }
}

impl From<&Shared<StatefulSet>> for Target {
    fn from(handle: &Shared<StatefulSet>) -> Self {
        Target::StatefulSet(handle.clone())
    }
}

impl From<Shared<StatefulSet>> for Target {
    fn from(handle: Shared<StatefulSet>) -> Self {
        Target::StatefulSet(handle)
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Name(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::Name(name)
    }
}
