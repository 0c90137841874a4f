//! Resource Graph Builders
//!
//! Factory functions that build several related resources with consistent
//! names and cross-references. The naming convention is part of the contract:
//! a Service for workload `x` is always `x-service`, an autoscaler `x-hpa`.
//!
//! A [`ResourceGraph`] is only an ordered group of resources for one
//! orchestration call. Grouping has no effect on the members.

use indexmap::IndexMap;

use crate::resource::{
    Deployment, HorizontalPodAutoscaler, Resource, Service, ServiceType, Shared, StatefulSet,
    Target,
};
use crate::Result;

/// Default port when neither the caller nor the workload names one
pub const DEFAULT_PORT: u16 = 80;

/// Name of the Service built for a workload
pub fn service_name(workload: &str) -> String {
    format!("{workload}-service")
}

/// Name of the autoscaler built for a workload
pub fn autoscaler_name(workload: &str) -> String {
    format!("{workload}-hpa")
}

// =============================================================================
// ResourceGraph
// =============================================================================

/// An ordered collection of resources applied together
///
/// Order is preserved exactly; the orchestrator never reorders it.
#[derive(Clone, Debug, Default)]
pub struct ResourceGraph {
    resources: Vec<Resource>,
}

impl ResourceGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource
    pub fn add(&mut self, resource: impl Into<Resource>) -> &mut Self {
        self.resources.push(resource.into());
        self
    }

    /// Append a resource, builder style
    pub fn with(mut self, resource: impl Into<Resource>) -> Self {
        self.add(resource);
        self
    }

    /// Resources in insertion order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the graph is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }
}

impl Extend<Resource> for ResourceGraph {
    fn extend<I: IntoIterator<Item = Resource>>(&mut self, iter: I) {
        self.resources.extend(iter);
    }
}

impl FromIterator<Resource> for ResourceGraph {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self {
            resources: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResourceGraph {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceGraph {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}

// =============================================================================
// service_for / autoscale_for
// =============================================================================

/// Options for [`service_for`]
#[derive(Clone, Debug, Default)]
pub struct ServiceOptions {
    /// Service port; defaults to the workload's port, then 80
    pub port: Option<u16>,
    /// Pinned target port; defaults to the workload's port at compile time
    pub target_port: Option<u16>,
    /// Exposure type
    pub service_type: ServiceType,
}

/// Build the Service `<workload>-service` selecting a workload
///
/// The Service lands in the workload's namespace. Unless pinned, its target
/// port follows the workload's port up to compilation.
pub fn service_for(workload: impl Into<Target>, options: ServiceOptions) -> Service {
    let target = workload.into();
    let name = service_name(&target.name());
    let port = options
        .port
        .or_else(|| target.port())
        .unwrap_or(DEFAULT_PORT);
    let namespace = target.namespace();

    let mut service = Service::new(name, target)
        .with_port(port)
        .with_type(options.service_type);
    if let Some(target_port) = options.target_port {
        service = service.with_target_port(target_port);
    }
    if let Some(namespace) = namespace {
        service = service.with_namespace(namespace);
    }
    service
}

/// Options for [`autoscale_for`]
#[derive(Clone, Copy, Debug)]
pub struct AutoscaleOptions {
    /// Lower replica bound
    pub min_replicas: i32,
    /// Upper replica bound
    pub max_replicas: i32,
    /// CPU utilization target in percent
    pub cpu_percent: i32,
}

impl Default for AutoscaleOptions {
    fn default() -> Self {
        Self {
            min_replicas: 1,
            max_replicas: 10,
            cpu_percent: crate::resource::DEFAULT_CPU_PERCENT,
        }
    }
}

/// Build the autoscaler `<workload>-hpa` for a workload
///
/// Fails if the bounds are inconsistent.
pub fn autoscale_for(
    workload: impl Into<Target>,
    options: AutoscaleOptions,
) -> Result<HorizontalPodAutoscaler> {
    let target = workload.into();
    let name = autoscaler_name(&target.name());
    let namespace = target.namespace();

    let mut hpa = HorizontalPodAutoscaler::new(
        name,
        target,
        options.min_replicas,
        options.max_replicas,
    )?
    .with_cpu_percent(options.cpu_percent);
    if let Some(namespace) = namespace {
        hpa = hpa.with_namespace(namespace);
    }
    hpa.validate()?;
    Ok(hpa)
}

// =============================================================================
// web_app
// =============================================================================

/// Options for [`web_app`]
#[derive(Clone, Debug)]
pub struct WebAppOptions {
    /// Replica count, also the autoscaler's lower bound
    pub replicas: i32,
    /// Container port
    pub port: u16,
    /// Container environment
    pub env: IndexMap<String, String>,
    /// Add an autoscaler scaling between `replicas` and `3 * replicas`
    pub auto_scale: bool,
    /// Exposure type of the Service
    pub service_type: ServiceType,
    /// Namespace for every resource; the default namespace when unset
    pub namespace: Option<String>,
}

impl Default for WebAppOptions {
    fn default() -> Self {
        Self {
            replicas: 3,
            port: DEFAULT_PORT,
            env: IndexMap::new(),
            auto_scale: true,
            service_type: ServiceType::LoadBalancer,
            namespace: None,
        }
    }
}

/// A web application: Deployment, Service and optional autoscaler
#[derive(Clone, Debug)]
pub struct WebApp {
    /// The workload
    pub deployment: Shared<Deployment>,
    /// `<name>-service`, selecting the workload
    pub service: Shared<Service>,
    /// `<name>-hpa`, when auto-scaling was requested
    pub autoscaler: Option<Shared<HorizontalPodAutoscaler>>,
}

impl WebApp {
    /// Resources in apply order: Deployment, Service, then autoscaler
    pub fn resources(&self) -> Vec<Resource> {
        let mut resources = vec![
            Resource::from(&self.deployment),
            Resource::from(&self.service),
        ];
        resources.extend(self.autoscaler.as_ref().map(Resource::from));
        resources
    }
}

impl From<WebApp> for ResourceGraph {
    fn from(app: WebApp) -> Self {
        app.resources().into_iter().collect()
    }
}

/// Build a Deployment, its Service and (optionally) its autoscaler
pub fn web_app(
    name: impl Into<String>,
    image: impl Into<String>,
    options: WebAppOptions,
) -> Result<WebApp> {
    let mut deployment = Deployment::new(name, image)
        .with_replicas(options.replicas)
        .with_port(options.port);
    deployment.env = options.env;
    if let Some(namespace) = options.namespace {
        deployment = deployment.with_namespace(namespace);
    }
    let deployment = deployment.shared();

    let service = service_for(
        &deployment,
        ServiceOptions {
            service_type: options.service_type,
            ..ServiceOptions::default()
        },
    )
    .shared();

    let autoscaler = if options.auto_scale {
        let hpa = autoscale_for(
            &deployment,
            AutoscaleOptions {
                min_replicas: options.replicas,
                max_replicas: options.replicas.saturating_mul(3),
                ..AutoscaleOptions::default()
            },
        )?;
        Some(hpa.shared())
    } else {
        None
    };

    Ok(WebApp {
        deployment,
        service,
        autoscaler,
    })
}

// =============================================================================
// database
// =============================================================================

/// Options for [`database`]
#[derive(Clone, Debug, Default)]
pub struct DatabaseOptions {
    /// Container port; the Service listens on it (80 when unset)
    pub port: Option<u16>,
    /// Container environment
    pub env: IndexMap<String, String>,
    /// Storage class; `standard` when unset
    pub storage_class: Option<String>,
    /// Namespace for both resources; the default namespace when unset
    pub namespace: Option<String>,
}

/// A database: StatefulSet with persistent storage and a ClusterIP Service
#[derive(Clone, Debug)]
pub struct Database {
    /// The stateful workload
    pub stateful_set: Shared<StatefulSet>,
    /// `<name>-service`, selecting the workload
    pub service: Shared<Service>,
}

impl Database {
    /// Resources in apply order: StatefulSet, then Service
    pub fn resources(&self) -> Vec<Resource> {
        vec![
            Resource::from(&self.stateful_set),
            Resource::from(&self.service),
        ]
    }
}

impl From<Database> for ResourceGraph {
    fn from(db: Database) -> Self {
        db.resources().into_iter().collect()
    }
}

/// Build a StatefulSet with `storage` per replica and its Service
pub fn database(
    name: impl Into<String>,
    image: impl Into<String>,
    storage: impl Into<String>,
    options: DatabaseOptions,
) -> Database {
    let mut stateful_set = StatefulSet::new(name, image).with_storage(storage);
    stateful_set.env = options.env;
    stateful_set.port = options.port;
    if let Some(storage_class) = options.storage_class {
        stateful_set = stateful_set.with_storage_class(storage_class);
    }
    if let Some(namespace) = options.namespace {
        stateful_set = stateful_set.with_namespace(namespace);
    }
    let stateful_set = stateful_set.shared();

    let service = service_for(&stateful_set, ServiceOptions::default()).shared();

    Database {
        stateful_set,
        service,
    }
}
