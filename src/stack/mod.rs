//! Declarative stack files
//!
//! A stack file is YAML listing resources in apply order:
//!
//! ```yaml
//! namespace: shop
//! resources:
//!   - kind: WebApp
//!     name: storefront
//!     image: shop/storefront:1.4
//!     port: 8080
//!   - kind: Database
//!     name: orders-db
//!     image: postgres:16
//!     storage: 20Gi
//!   - kind: HorizontalPodAutoscaler
//!     name: worker-hpa
//!     target: worker
//!     maxReplicas: 4
//! ```
//!
//! `target` names bind to a Deployment or StatefulSet declared earlier in the
//! same file when one matches, so the Service/HPA follows that workload's
//! port and kind, and lands in its namespace unless the entry names one.
//! Unmatched names are kept as raw names.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::graph::{self, AutoscaleOptions, DatabaseOptions, ResourceGraph, WebAppOptions};
use crate::resource::{
    ComputeResources, ConfigMap, Deployment, HorizontalPodAutoscaler, ResourceMeta, Secret,
    Service, ServiceType, StatefulSet, Target,
};
use crate::{Error, Result};

/// A parsed stack file
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Stack {
    /// Namespace for entries that don't name one
    #[serde(default)]
    pub namespace: Option<String>,
    /// Entries in apply order
    #[serde(default)]
    pub resources: Vec<StackEntry>,
}

/// One entry of a stack file, tagged by `kind`
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind")]
pub enum StackEntry {
    /// Deployment, Service and optional autoscaler built by [`graph::web_app`]
    WebApp(WebAppEntry),
    /// StatefulSet and Service built by [`graph::database`]
    Database(DatabaseEntry),
    /// A single Deployment
    Deployment(DeploymentEntry),
    /// A single Service
    Service(ServiceEntry),
    /// A single StatefulSet
    StatefulSet(StatefulSetEntry),
    /// A single ConfigMap
    ConfigMap(ConfigMapEntry),
    /// A single Secret
    Secret(SecretEntry),
    /// A single autoscaler
    HorizontalPodAutoscaler(AutoscalerEntry),
}

impl StackEntry {
    /// The `kind` tag of the entry
    pub fn kind(&self) -> &'static str {
        match self {
            StackEntry::WebApp(_) => "WebApp",
            StackEntry::Database(_) => "Database",
            StackEntry::Deployment(_) => "Deployment",
            StackEntry::Service(_) => "Service",
            StackEntry::StatefulSet(_) => "StatefulSet",
            StackEntry::ConfigMap(_) => "ConfigMap",
            StackEntry::Secret(_) => "Secret",
            StackEntry::HorizontalPodAutoscaler(_) => "HorizontalPodAutoscaler",
        }
    }

    /// Metadata shared by every entry
    pub fn meta(&self) -> &EntryMeta {
        match self {
            StackEntry::WebApp(e) => &e.meta,
            StackEntry::Database(e) => &e.meta,
            StackEntry::Deployment(e) => &e.meta,
            StackEntry::Service(e) => &e.meta,
            StackEntry::StatefulSet(e) => &e.meta,
            StackEntry::ConfigMap(e) => &e.meta,
            StackEntry::Secret(e) => &e.meta,
            StackEntry::HorizontalPodAutoscaler(e) => &e.meta,
        }
    }
}

/// Metadata accepted on every entry
///
/// `deny_unknown_fields` does not combine with `flatten`, so keys no entry
/// field claims are collected in `unknown` and rejected by [`Stack::parse`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMeta {
    /// Resource name
    pub name: String,
    /// Namespace override
    #[serde(default)]
    pub namespace: Option<String>,
    /// Labels replacing the defaults
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(flatten)]
    unknown: BTreeMap<String, serde_yaml::Value>,
}

/// `kind: WebApp`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAppEntry {
    /// Name, namespace, labels, annotations
    #[serde(flatten)]
    pub meta: EntryMeta,
    /// Container image
    pub image: String,
    /// Replica count, also the autoscaler's lower bound (3)
    pub replicas: Option<i32>,
    /// Container and Service port (80)
    pub port: Option<u16>,
    /// Container environment, in declaration order
    #[serde(default)]
    pub env: IndexMap<String, String>,
    /// Add an autoscaler (true)
    pub auto_scale: Option<bool>,
    /// Service exposure (LoadBalancer)
    pub service_type: Option<ServiceType>,
}

/// `kind: Database`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseEntry {
    /// Name, namespace, labels, annotations
    #[serde(flatten)]
    pub meta: EntryMeta,
    /// Container image
    pub image: String,
    /// Volume size per replica (10Gi)
    pub storage: Option<String>,
    /// Storage class (standard)
    pub storage_class: Option<String>,
    /// Container and Service port
    pub port: Option<u16>,
    /// Container environment, in declaration order
    #[serde(default)]
    pub env: IndexMap<String, String>,
}

/// Requests and limits; unset fields keep their defaults
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComputeEntry {
    /// CPU request (100m)
    pub cpu_request: Option<String>,
    /// Memory request (128Mi)
    pub memory_request: Option<String>,
    /// CPU limit (500m)
    pub cpu_limit: Option<String>,
    /// Memory limit (512Mi)
    pub memory_limit: Option<String>,
}

/// `kind: Deployment`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentEntry {
    /// Name, namespace, labels, annotations
    #[serde(flatten)]
    pub meta: EntryMeta,
    /// Container image
    pub image: String,
    /// Replica count (1)
    pub replicas: Option<i32>,
    /// Container port
    pub port: Option<u16>,
    /// Container environment, in declaration order
    #[serde(default)]
    pub env: IndexMap<String, String>,
    /// Requests and limits
    #[serde(default)]
    pub resources: ComputeEntry,
    /// Emit the `auto-heal` label (true)
    pub auto_heal: Option<bool>,
}

/// `kind: Service`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    /// Name, namespace, labels, annotations
    #[serde(flatten)]
    pub meta: EntryMeta,
    /// Workload name; binds to an earlier entry when one matches
    pub target: String,
    /// Service port (the target's port, else 80)
    pub port: Option<u16>,
    /// Explicit target port
    pub target_port: Option<u16>,
    /// Exposure type (ClusterIP)
    pub service_type: Option<ServiceType>,
}

/// `kind: StatefulSet`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSetEntry {
    /// Name, namespace, labels, annotations
    #[serde(flatten)]
    pub meta: EntryMeta,
    /// Container image
    pub image: String,
    /// Replica count (1)
    pub replicas: Option<i32>,
    /// Container port
    pub port: Option<u16>,
    /// Volume size per replica (10Gi)
    pub storage: Option<String>,
    /// Storage class (standard)
    pub storage_class: Option<String>,
    /// Container environment, in declaration order
    #[serde(default)]
    pub env: IndexMap<String, String>,
}

/// `kind: ConfigMap`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapEntry {
    /// Name, namespace, labels, annotations
    #[serde(flatten)]
    pub meta: EntryMeta,
    /// String entries
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// `kind: Secret` (plaintext values)
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretEntry {
    /// Name, namespace, labels, annotations
    #[serde(flatten)]
    pub meta: EntryMeta,
    /// Plaintext entries, encoded at compile time
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    /// Secret type (Opaque)
    #[serde(rename = "type")]
    pub secret_type: Option<String>,
}

/// `kind: HorizontalPodAutoscaler`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoscalerEntry {
    /// Name, namespace, labels, annotations
    #[serde(flatten)]
    pub meta: EntryMeta,
    /// Workload name; binds to an earlier entry when one matches
    pub target: String,
    /// Lower bound (1)
    pub min_replicas: Option<i32>,
    /// Upper bound (10)
    pub max_replicas: Option<i32>,
    /// Target CPU utilization percent (80)
    pub cpu_percent: Option<i32>,
}

impl Stack {
    /// Parse a stack from YAML; `source` names the input in errors
    ///
    /// Keys an entry does not recognize are rejected rather than ignored.
    pub fn parse(source: &str, yaml: &str) -> Result<Self> {
        let stack: Self =
            serde_yaml::from_str(yaml).map_err(|e| Error::invalid_stack(source, e.to_string()))?;

        for (index, entry) in stack.resources.iter().enumerate() {
            if let Some(key) = entry.meta().unknown.keys().next() {
                return Err(Error::invalid_stack(
                    source,
                    format!(
                        "resources[{index}]: unknown field `{key}` in {} `{}`",
                        entry.kind(),
                        entry.meta().name
                    ),
                ));
            }
        }
        Ok(stack)
    }

    /// Read and parse a stack file
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("read stack file {}", path.display()), e))?;
        Self::parse(&path.display().to_string(), &yaml)
    }

    /// Build the resources in file order
    pub fn build(&self) -> Result<ResourceGraph> {
        let mut builder = GraphBuilder {
            default_namespace: self.namespace.clone(),
            workloads: HashMap::new(),
            graph: ResourceGraph::new(),
        };
        for entry in &self.resources {
            builder.add(entry)?;
        }
        debug!(resources = builder.graph.len(), "built stack");
        Ok(builder.graph)
    }
}

/// Read a stack file and build its resources
pub fn load_graph(path: &Path) -> Result<ResourceGraph> {
    Stack::load(path)?.build()
}

struct GraphBuilder {
    default_namespace: Option<String>,
    workloads: HashMap<String, Target>,
    graph: ResourceGraph,
}

impl GraphBuilder {
    fn add(&mut self, entry: &StackEntry) -> Result<()> {
        match entry {
            StackEntry::WebApp(e) => {
                let defaults = WebAppOptions::default();
                let app = graph::web_app(
                    &e.meta.name,
                    &e.image,
                    WebAppOptions {
                        replicas: e.replicas.unwrap_or(defaults.replicas),
                        port: e.port.unwrap_or(defaults.port),
                        env: e.env.clone(),
                        auto_scale: e.auto_scale.unwrap_or(defaults.auto_scale),
                        service_type: e.service_type.unwrap_or(defaults.service_type),
                        namespace: Some(self.namespace_for(&e.meta)),
                    },
                )?;
                apply_labels(&mut app.deployment.write().meta, &e.meta);
                self.workloads
                    .insert(e.meta.name.clone(), Target::from(&app.deployment));
                self.graph.extend(app.resources());
            }
            StackEntry::Database(e) => {
                let db = graph::database(
                    &e.meta.name,
                    &e.image,
                    e.storage
                        .clone()
                        .unwrap_or_else(|| crate::resource::DEFAULT_STORAGE.to_string()),
                    DatabaseOptions {
                        port: e.port,
                        env: e.env.clone(),
                        storage_class: e.storage_class.clone(),
                        namespace: Some(self.namespace_for(&e.meta)),
                    },
                );
                apply_labels(&mut db.stateful_set.write().meta, &e.meta);
                self.workloads
                    .insert(e.meta.name.clone(), Target::from(&db.stateful_set));
                self.graph.extend(db.resources());
            }
            StackEntry::Deployment(e) => {
                let defaults = ComputeResources::default();
                let compute = &e.resources;
                let resources = ComputeResources {
                    cpu_request: compute.cpu_request.clone().unwrap_or(defaults.cpu_request),
                    memory_request: compute
                        .memory_request
                        .clone()
                        .unwrap_or(defaults.memory_request),
                    cpu_limit: compute.cpu_limit.clone().unwrap_or(defaults.cpu_limit),
                    memory_limit: compute.memory_limit.clone().unwrap_or(defaults.memory_limit),
                };
                let mut d = Deployment::new(&e.meta.name, &e.image).with_resources(resources);
                if let Some(replicas) = e.replicas {
                    d.replicas = replicas;
                }
                if let Some(auto_heal) = e.auto_heal {
                    d.auto_heal = auto_heal;
                }
                d.port = e.port;
                d.env = e.env.clone();
                self.fill_meta(&mut d.meta, &e.meta);

                let d = d.shared();
                self.workloads.insert(e.meta.name.clone(), Target::from(&d));
                self.graph.add(d);
            }
            StackEntry::Service(e) => {
                let target = self.target(&e.target);
                let mut svc = Service::new(&e.meta.name, target);
                if let Some(port) = e.port.or_else(|| svc.target.port()) {
                    svc.port = port;
                }
                svc.target_port = e.target_port;
                svc.service_type = e.service_type.unwrap_or_default();
                self.fill_bound_meta(&mut svc.meta, &e.meta, &svc.target);
                self.graph.add(svc);
            }
            StackEntry::StatefulSet(e) => {
                let mut s = StatefulSet::new(&e.meta.name, &e.image);
                if let Some(replicas) = e.replicas {
                    s.replicas = replicas;
                }
                if let Some(storage) = &e.storage {
                    s.storage = storage.clone();
                }
                if let Some(storage_class) = &e.storage_class {
                    s.storage_class = storage_class.clone();
                }
                s.port = e.port;
                s.env = e.env.clone();
                self.fill_meta(&mut s.meta, &e.meta);

                let s = s.shared();
                self.workloads.insert(e.meta.name.clone(), Target::from(&s));
                self.graph.add(s);
            }
            StackEntry::ConfigMap(e) => {
                let mut cm = ConfigMap::new(&e.meta.name).with_data(e.data.clone());
                self.fill_meta(&mut cm.meta, &e.meta);
                self.graph.add(cm);
            }
            StackEntry::Secret(e) => {
                let mut secret = Secret::new(&e.meta.name).with_data(e.data.clone());
                if let Some(secret_type) = &e.secret_type {
                    secret.secret_type = secret_type.clone();
                }
                self.fill_meta(&mut secret.meta, &e.meta);
                self.graph.add(secret);
            }
            StackEntry::HorizontalPodAutoscaler(e) => {
                let defaults = AutoscaleOptions::default();
                let mut hpa = HorizontalPodAutoscaler::new(
                    &e.meta.name,
                    self.target(&e.target),
                    e.min_replicas.unwrap_or(defaults.min_replicas),
                    e.max_replicas.unwrap_or(defaults.max_replicas),
                )?
                .with_cpu_percent(e.cpu_percent.unwrap_or(defaults.cpu_percent));
                self.fill_bound_meta(&mut hpa.meta, &e.meta, &hpa.target);
                self.graph.add(hpa);
            }
        }
        Ok(())
    }

    fn namespace_for(&self, meta: &EntryMeta) -> String {
        meta.namespace
            .clone()
            .or_else(|| self.default_namespace.clone())
            .unwrap_or_else(|| crate::DEFAULT_NAMESPACE.to_string())
    }

    fn fill_meta(&self, target: &mut ResourceMeta, entry: &EntryMeta) {
        target.namespace = self.namespace_for(entry);
        apply_labels(target, entry);
    }

    /// Services and autoscalers live beside the workload they bind to
    fn fill_bound_meta(&self, target: &mut ResourceMeta, entry: &EntryMeta, bound: &Target) {
        target.namespace = match (&entry.namespace, bound.namespace()) {
            (None, Some(namespace)) => namespace,
            _ => self.namespace_for(entry),
        };
        apply_labels(target, entry);
    }

    fn target(&self, name: &str) -> Target {
        self.workloads
            .get(name)
            .cloned()
            .unwrap_or_else(|| Target::from(name))
    }
}

fn apply_labels(target: &mut ResourceMeta, entry: &EntryMeta) {
    if !entry.labels.is_empty() {
        target.set_labels(entry.labels.clone());
    }
    target.annotations.extend(entry.annotations.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ManifestCompiler;
    use crate::resource::{Resource, ResourceKind};
    use crate::workload::Manifest;
    use std::io::Write;

    const SHOP: &str = r#"
namespace: shop
resources:
  - kind: Secret
    name: db-creds
    data:
      password: hunter2
  - kind: Database
    name: orders-db
    image: postgres:16
    storage: 20Gi
    port: 5432
  - kind: WebApp
    name: storefront
    image: shop/storefront:1.4
    port: 8080
    replicas: 2
  - kind: Deployment
    name: worker
    image: shop/worker:1.4
    namespace: jobs
    env:
      QUEUE: orders
  - kind: HorizontalPodAutoscaler
    name: worker-hpa
    target: worker
    maxReplicas: 4
  - kind: Service
    name: legacy-service
    target: legacy
    port: 8443
"#;

    // =========================================================================
    // Story: Loading a Stack
    // =========================================================================

    #[test]
    fn story_stack_builds_resources_in_file_order() {
        let graph = Stack::parse("shop.yaml", SHOP).unwrap().build().unwrap();

        let kinds: Vec<ResourceKind> = graph.iter().map(Resource::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Secret,
                ResourceKind::StatefulSet,
                ResourceKind::Service,
                ResourceKind::Deployment,
                ResourceKind::Service,
                ResourceKind::HorizontalPodAutoscaler,
                ResourceKind::Deployment,
                ResourceKind::HorizontalPodAutoscaler,
                ResourceKind::Service,
            ]
        );

        let names: Vec<String> = graph.iter().map(Resource::name).collect();
        assert_eq!(names[2], "orders-db-service");
        assert_eq!(names[5], "storefront-hpa");
    }

    #[test]
    fn story_namespaces_default_from_the_stack() {
        let graph = Stack::parse("shop.yaml", SHOP).unwrap().build().unwrap();
        let namespaces: Vec<String> = graph.iter().map(Resource::namespace).collect();

        assert_eq!(namespaces[0], "shop");
        assert_eq!(namespaces[4], "shop");
        assert_eq!(namespaces[6], "jobs");
        // The autoscaler names no namespace and follows its bound workload
        assert_eq!(namespaces[7], "jobs");
        // Unbound targets fall back to the stack's namespace
        assert_eq!(namespaces[8], "shop");
    }

    #[test]
    fn story_bound_service_and_autoscaler_follow_the_workload_namespace() {
        let yaml = r#"
namespace: shop
resources:
  - kind: Deployment
    name: worker
    image: shop/worker:1.4
    namespace: jobs
  - kind: HorizontalPodAutoscaler
    name: worker-hpa
    target: worker
  - kind: Service
    name: worker-svc
    target: worker
  - kind: Service
    name: worker-admin
    target: worker
    namespace: admin
"#;
        let graph = Stack::parse("worker.yaml", yaml).unwrap().build().unwrap();
        let namespaces: Vec<String> = graph.iter().map(Resource::namespace).collect();

        assert_eq!(namespaces, vec!["jobs", "jobs", "jobs", "admin"]);
    }

    #[test]
    fn story_targets_bind_to_earlier_workloads() {
        let graph = Stack::parse("shop.yaml", SHOP).unwrap().build().unwrap();
        let docs = ManifestCompiler::compile_all(graph.resources()).unwrap();

        match &docs[2] {
            Manifest::Service(svc) => {
                assert_eq!(svc.spec.ports[0].port, 5432);
                assert_eq!(svc.spec.ports[0].target_port, 5432);
            }
            other => panic!("expected Service, got {}", other.kind()),
        }
        match &docs[7] {
            Manifest::HorizontalPodAutoscaler(hpa) => {
                assert_eq!(hpa.spec.scale_target_ref.name, "worker");
                assert_eq!(hpa.spec.min_replicas, 1);
                assert_eq!(hpa.spec.max_replicas, 4);
            }
            other => panic!("expected HPA, got {}", other.kind()),
        }
        match &docs[8] {
            Manifest::Service(svc) => {
                assert_eq!(svc.spec.selector.get("app"), Some(&"legacy".to_string()));
                assert_eq!(svc.spec.ports[0].target_port, 8443);
            }
            other => panic!("expected Service, got {}", other.kind()),
        }
    }

    #[test]
    fn story_stack_loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SHOP.as_bytes()).unwrap();

        let graph = load_graph(file.path()).unwrap();
        assert_eq!(graph.len(), 9);
    }

    // =========================================================================
    // Story: Invalid Stacks
    // =========================================================================

    #[test]
    fn unknown_kind_is_an_invalid_stack() {
        let yaml = "resources:\n  - kind: Ingress\n    name: web\n";
        let err = Stack::parse("bad.yaml", yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidStack { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn unknown_top_level_field_is_rejected() {
        let yaml = "namespaces: shop\nresources: []\n";
        assert!(Stack::parse("bad.yaml", yaml).is_err());
    }

    #[test]
    fn misspelled_entry_field_is_rejected() {
        let yaml = r#"
resources:
  - kind: Deployment
    name: web
    image: nginx
    replica: 3
"#;
        let err = Stack::parse("typo.yaml", yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidStack { .. }));
        let message = err.to_string();
        assert!(message.contains("`replica`"), "{message}");
        assert!(message.contains("Deployment `web`"), "{message}");
    }

    #[test]
    fn nested_compute_typo_is_rejected() {
        let yaml = r#"
resources:
  - kind: Deployment
    name: web
    image: nginx
    resources:
      cpuRequests: 200m
"#;
        assert!(Stack::parse("typo.yaml", yaml).is_err());
    }

    #[test]
    fn env_keeps_file_order() {
        let yaml = r#"
resources:
  - kind: Deployment
    name: web
    image: nginx
    env:
      ZONE: eu
      HOST: web.$(ZONE)
      ADDR: $(HOST):80
"#;
        let graph = Stack::parse("env.yaml", yaml).unwrap().build().unwrap();
        match &graph.resources()[0] {
            Resource::Deployment(d) => {
                let d = d.read();
                let keys: Vec<&str> = d.env.keys().map(String::as_str).collect();
                assert_eq!(keys, vec!["ZONE", "HOST", "ADDR"]);
            }
            other => panic!("expected Deployment, got {}", other.kind()),
        }
    }

    #[test]
    fn inverted_hpa_bounds_fail_the_build() {
        let yaml = r#"
resources:
  - kind: HorizontalPodAutoscaler
    name: web-hpa
    target: web
    minReplicas: 5
    maxReplicas: 2
"#;
        let err = Stack::parse("hpa.yaml", yaml).unwrap().build().unwrap_err();
        assert_eq!(err.resource(), Some(("HorizontalPodAutoscaler", "web-hpa")));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_graph(Path::new("/nonexistent/stack.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn labels_and_annotations_apply() {
        let yaml = r#"
resources:
  - kind: ConfigMap
    name: cfg
    labels:
      team: platform
    annotations:
      owner: ops
    data:
      A: "1"
"#;
        let graph = Stack::parse("cfg.yaml", yaml).unwrap().build().unwrap();
        match &graph.resources()[0] {
            Resource::ConfigMap(cm) => {
                let cm = cm.read();
                assert_eq!(cm.meta.labels.len(), 1);
                assert_eq!(cm.meta.annotations.get("owner"), Some(&"ops".to_string()));
                assert_eq!(cm.data.get("A"), Some(&"1".to_string()));
            }
            other => panic!("expected ConfigMap, got {}", other.kind()),
        }
    }
}
