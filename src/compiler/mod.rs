//! Manifest Compiler
//!
//! Maps a resource's current field values to a Kubernetes API document. Every
//! compile re-validates the resource first, so an inconsistent object fails
//! with [`Error::Configuration`](crate::Error::Configuration) instead of
//! producing a partial document.
//!
//! # Usage
//!
//! ```text
//! let docs = ManifestCompiler::compile_all(&graph.resources())?;
//! let yaml = render_stream(&docs)?;
//! ```
//!
//! Target references (Service/HPA) are resolved here, against the live state
//! of the referenced workload.

use base64::Engine;
use indexmap::IndexMap;
use tracing::debug;

use crate::resource::{self, Resource, Target};
use crate::workload::{
    ClaimMeta, ConfigMap, Container, ContainerPort, Deployment, DeploymentSpec, EnvVar, HpaSpec,
    HorizontalPodAutoscaler, LabelSelector, Manifest, MetricSpec, MetricTarget, ObjectMeta,
    PersistentVolumeClaimSpec, PersistentVolumeClaimTemplate, PodMeta, PodSpec, PodTemplateSpec,
    ResourceMetricSource, ResourceQuantity, ResourceRequirements, ScaleTargetRef, Secret, Service,
    ServicePort, ServiceSpec, StatefulSet, StatefulSetSpec, StorageRequest, VolumeMount,
    VolumeResources,
};
use crate::{Result, DOCUMENT_SEPARATOR, LABEL_APP, LABEL_AUTO_HEAL};

/// Where a StatefulSet mounts its per-replica volume
pub const STATEFUL_MOUNT_PATH: &str = "/var/lib/data";

/// Stateless compiler from resources to documents
pub struct ManifestCompiler;

impl ManifestCompiler {
    /// Compile one resource into a document
    pub fn compile(resource: &Resource) -> Result<Manifest> {
        let manifest = match resource {
            Resource::Deployment(d) => Manifest::Deployment(Self::compile_deployment(&d.read())?),
            Resource::Service(s) => Manifest::Service(Self::compile_service(&s.read())?),
            Resource::StatefulSet(s) => {
                Manifest::StatefulSet(Self::compile_stateful_set(&s.read())?)
            }
            Resource::ConfigMap(c) => Manifest::ConfigMap(Self::compile_config_map(&c.read())?),
            Resource::Secret(s) => Manifest::Secret(Self::compile_secret(&s.read())?),
            Resource::HorizontalPodAutoscaler(h) => {
                Manifest::HorizontalPodAutoscaler(Self::compile_hpa(&h.read())?)
            }
        };

        debug!(
            kind = manifest.kind(),
            name = manifest.name(),
            namespace = manifest.namespace().unwrap_or_default(),
            "compiled resource"
        );
        Ok(manifest)
    }

    /// Compile resources in order, stopping at the first failure
    pub fn compile_all(resources: &[Resource]) -> Result<Vec<Manifest>> {
        resources.iter().map(Self::compile).collect()
    }

    /// Compile a Deployment
    pub fn compile_deployment(d: &resource::Deployment) -> Result<Deployment> {
        d.validate()?;
        let name = d.name();

        let mut labels = d.meta.labels.clone();
        if d.auto_heal {
            labels.insert(LABEL_AUTO_HEAL.to_string(), "true".to_string());
        }

        // The selector matches on app=<name>, so the pod template must carry it
        let mut pod_labels = labels.clone();
        pod_labels.insert(LABEL_APP.to_string(), name.to_string());

        let container = Container {
            name: name.to_string(),
            image: d.image.clone(),
            ports: container_ports(d.port),
            env: env_vars(&d.env),
            resources: Some(ResourceRequirements {
                requests: ResourceQuantity {
                    cpu: d.resources.cpu_request.clone(),
                    memory: d.resources.memory_request.clone(),
                },
                limits: ResourceQuantity {
                    cpu: d.resources.cpu_limit.clone(),
                    memory: d.resources.memory_limit.clone(),
                },
            }),
            volume_mounts: vec![],
        };

        Ok(Deployment {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            metadata: object_meta(&d.meta).with_labels(labels),
            spec: DeploymentSpec {
                replicas: d.replicas,
                selector: LabelSelector::app(name),
                template: PodTemplateSpec {
                    metadata: PodMeta { labels: pod_labels },
                    spec: PodSpec {
                        containers: vec![container],
                    },
                },
            },
        })
    }

    /// Compile a Service, resolving its target
    pub fn compile_service(s: &resource::Service) -> Result<Service> {
        s.validate()?;

        Ok(Service {
            api_version: "v1".to_string(),
            kind: "Service".to_string(),
            metadata: object_meta(&s.meta),
            spec: ServiceSpec {
                selector: LabelSelector::app(s.target.name()).match_labels,
                ports: vec![ServicePort {
                    port: s.port,
                    target_port: s.resolved_target_port(),
                    protocol: "TCP".to_string(),
                }],
                type_: s.service_type.to_string(),
            },
        })
    }

    /// Compile a StatefulSet with one shared volume claim template
    pub fn compile_stateful_set(s: &resource::StatefulSet) -> Result<StatefulSet> {
        s.validate()?;
        let name = s.name();
        let claim = s.claim_name();

        let container = Container {
            name: name.to_string(),
            image: s.image.clone(),
            ports: container_ports(s.port),
            env: env_vars(&s.env),
            resources: None,
            volume_mounts: vec![VolumeMount {
                name: claim.clone(),
                mount_path: STATEFUL_MOUNT_PATH.to_string(),
            }],
        };

        let selector = LabelSelector::app(name);
        Ok(StatefulSet {
            api_version: "apps/v1".to_string(),
            kind: "StatefulSet".to_string(),
            metadata: object_meta(&s.meta),
            spec: StatefulSetSpec {
                service_name: name.to_string(),
                replicas: s.replicas,
                template: PodTemplateSpec {
                    metadata: PodMeta {
                        labels: selector.match_labels.clone(),
                    },
                    spec: PodSpec {
                        containers: vec![container],
                    },
                },
                selector,
                volume_claim_templates: vec![PersistentVolumeClaimTemplate {
                    metadata: ClaimMeta { name: claim },
                    spec: PersistentVolumeClaimSpec {
                        access_modes: vec!["ReadWriteOnce".to_string()],
                        storage_class_name: s.storage_class.clone(),
                        resources: VolumeResources {
                            requests: StorageRequest {
                                storage: s.storage.clone(),
                            },
                        },
                    },
                }],
            },
        })
    }

    /// Compile a ConfigMap; data is emitted as-is
    pub fn compile_config_map(c: &resource::ConfigMap) -> Result<ConfigMap> {
        c.validate()?;
        Ok(ConfigMap {
            api_version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
            metadata: object_meta(&c.meta),
            data: c.data.clone(),
        })
    }

    /// Compile a Secret, base64-encoding each value
    ///
    /// Values are Rust strings and therefore always valid UTF-8, so encoding
    /// cannot lose data.
    pub fn compile_secret(s: &resource::Secret) -> Result<Secret> {
        s.validate()?;
        let engine = base64::engine::general_purpose::STANDARD;
        let data = s
            .data
            .iter()
            .map(|(k, v)| (k.clone(), engine.encode(v.as_bytes())))
            .collect();

        Ok(Secret {
            api_version: "v1".to_string(),
            kind: "Secret".to_string(),
            metadata: object_meta(&s.meta),
            type_: s.secret_type.clone(),
            data,
        })
    }

    /// Compile a HorizontalPodAutoscaler with a single CPU utilization metric
    pub fn compile_hpa(h: &resource::HorizontalPodAutoscaler) -> Result<HorizontalPodAutoscaler> {
        h.validate()?;
        Ok(HorizontalPodAutoscaler {
            api_version: "autoscaling/v2".to_string(),
            kind: "HorizontalPodAutoscaler".to_string(),
            metadata: object_meta(&h.meta),
            spec: HpaSpec {
                scale_target_ref: scale_target_ref(&h.target),
                min_replicas: h.min_replicas,
                max_replicas: h.max_replicas,
                metrics: vec![MetricSpec {
                    type_: "Resource".to_string(),
                    resource: ResourceMetricSource {
                        name: "cpu".to_string(),
                        target: MetricTarget {
                            type_: "Utilization".to_string(),
                            average_utilization: h.cpu_percent,
                        },
                    },
                }],
            },
        })
    }
}

/// Render documents as one multi-document YAML stream, in order
///
/// Documents are separated by a `---` line. An empty slice renders as an
/// empty string.
pub fn render_stream(manifests: &[Manifest]) -> Result<String> {
    let docs = manifests
        .iter()
        .map(Manifest::to_yaml)
        .collect::<Result<Vec<_>>>()?;
    let separator = format!("{DOCUMENT_SEPARATOR}\n");
    Ok(docs.join(separator.as_str()))
}

fn object_meta(meta: &resource::ResourceMeta) -> ObjectMeta {
    ObjectMeta::new(meta.name(), &meta.namespace)
        .with_labels(meta.labels.clone())
        .with_annotations(meta.annotations.clone())
}

fn container_ports(port: Option<u16>) -> Vec<ContainerPort> {
    port.map(|container_port| ContainerPort { container_port })
        .into_iter()
        .collect()
}

fn env_vars(env: &IndexMap<String, String>) -> Vec<EnvVar> {
    env.iter()
        .map(|(k, v)| EnvVar {
            name: k.clone(),
            value: v.clone(),
        })
        .collect()
}

fn scale_target_ref(target: &Target) -> ScaleTargetRef {
    ScaleTargetRef {
        api_version: "apps/v1".to_string(),
        kind: target.kind().to_string(),
        name: target.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use crate::resource::{
        ConfigMap as ConfigMapResource, Deployment as DeploymentResource,
        HorizontalPodAutoscaler as HpaResource, Secret as SecretResource,
        Service as ServiceResource, ServiceType, StatefulSet as StatefulSetResource,
    };
    use crate::Error;

    // =========================================================================
    // Story: Deployment Documents
    // =========================================================================

    #[test]
    fn story_deployment_without_port_or_env_omits_those_fields() {
        let d = DeploymentResource::new("web", "nginx:1.27");
        let doc = Manifest::Deployment(ManifestCompiler::compile_deployment(&d).unwrap());

        let value = doc.to_value().unwrap();
        let container = &value["spec"]["template"]["spec"]["containers"][0];
        assert_eq!(container["image"], "nginx:1.27");
        assert!(container.get("ports").is_none());
        assert!(container.get("env").is_none());
        assert_eq!(value["apiVersion"], "apps/v1");
    }

    #[test]
    fn story_deployment_with_port_and_env() {
        let d = DeploymentResource::new("api", "api:2")
            .with_replicas(3)
            .with_port(8080)
            .with_env("LOG_LEVEL", "debug");
        let doc = ManifestCompiler::compile_deployment(&d).unwrap();

        assert_eq!(doc.spec.replicas, 3);
        let container = &doc.spec.template.spec.containers[0];
        assert_eq!(container.ports[0].container_port, 8080);
        assert_eq!(container.env[0].name, "LOG_LEVEL");
        assert_eq!(container.env[0].value, "debug");

        let resources = container.resources.as_ref().unwrap();
        assert_eq!(resources.requests.cpu, "100m");
        assert_eq!(resources.limits.memory, "512Mi");
    }

    #[test]
    fn story_selector_always_matches_pod_template() {
        let mut labels = BTreeMap::new();
        labels.insert("team".to_string(), "payments".to_string());
        let d = DeploymentResource::new("web", "nginx").with_labels(labels);
        let doc = ManifestCompiler::compile_deployment(&d).unwrap();

        let pod_labels = &doc.spec.template.metadata.labels;
        for (k, v) in &doc.spec.selector.match_labels {
            assert_eq!(pod_labels.get(k), Some(v));
        }
        assert_eq!(pod_labels.get("team"), Some(&"payments".to_string()));
        // Object metadata keeps exactly the supplied labels plus auto-heal
        assert!(!doc.metadata.labels.contains_key("app"));
        assert_eq!(doc.metadata.labels.get("auto-heal"), Some(&"true".to_string()));
    }

    #[test]
    fn story_env_keeps_declaration_order() {
        // $(VAR) references only see variables declared before them
        let d = DeploymentResource::new("api", "api:2")
            .with_env("ZONE", "eu")
            .with_env("HOST", "api.$(ZONE)")
            .with_env("ADDR", "$(HOST):8080");
        let doc = ManifestCompiler::compile_deployment(&d).unwrap();

        let names: Vec<&str> = doc.spec.template.spec.containers[0]
            .env
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["ZONE", "HOST", "ADDR"]);
    }

    #[test]
    fn story_auto_heal_label_follows_flag() {
        let healed = DeploymentResource::new("web", "nginx");
        let doc = ManifestCompiler::compile_deployment(&healed).unwrap();
        assert_eq!(doc.metadata.labels["auto-heal"], "true");
        let pod = &doc.spec.template.metadata.labels;
        assert_eq!(pod["auto-heal"], "true");
        assert_eq!(pod["app"], "web");

        let d = DeploymentResource::new("web", "nginx").with_auto_heal(false);
        let doc = ManifestCompiler::compile_deployment(&d).unwrap();
        assert!(!doc.metadata.labels.contains_key("auto-heal"));
        assert!(!doc.spec.template.metadata.labels.contains_key("auto-heal"));
    }

    #[test]
    fn story_compiler_reads_live_state() {
        let d = DeploymentResource::new("web", "nginx").shared();
        let resource = Resource::from(&d);

        d.write().replicas = 5;
        d.write().env.insert("MODE".to_string(), "live".to_string());

        match ManifestCompiler::compile(&resource).unwrap() {
            Manifest::Deployment(doc) => {
                assert_eq!(doc.spec.replicas, 5);
                assert_eq!(doc.spec.template.spec.containers[0].env[0].value, "live");
            }
            other => panic!("expected Deployment, got {}", other.kind()),
        }
    }

    #[test]
    fn story_negative_replicas_fail_compilation() {
        let d = DeploymentResource::new("web", "nginx").shared();
        d.write().replicas = -1;

        let err = ManifestCompiler::compile(&Resource::from(&d)).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(err.resource(), Some(("Deployment", "web")));
    }

    // =========================================================================
    // Story: Service Target Resolution
    // =========================================================================

    #[test]
    fn story_service_target_port_resolved_at_compile_time() {
        let d = DeploymentResource::new("api", "api:1").with_port(8080).shared();
        let svc = ServiceResource::new("api-service", &d);

        d.write().port = Some(9090);
        let doc = ManifestCompiler::compile_service(&svc).unwrap();

        assert_eq!(doc.spec.ports.len(), 1);
        assert_eq!(doc.spec.ports[0].port, 80);
        assert_eq!(doc.spec.ports[0].target_port, 9090);
        assert_eq!(doc.spec.ports[0].protocol, "TCP");
        assert_eq!(doc.spec.selector.get("app"), Some(&"api".to_string()));
        assert_eq!(doc.spec.type_, "ClusterIP");
    }

    #[test]
    fn story_raw_name_target_uses_service_port() {
        let svc = ServiceResource::new("legacy-service", "legacy")
            .with_port(8443)
            .with_type(ServiceType::NodePort);
        let doc = ManifestCompiler::compile_service(&svc).unwrap();

        assert_eq!(doc.spec.ports[0].target_port, 8443);
        assert_eq!(doc.spec.selector.get("app"), Some(&"legacy".to_string()));
        assert_eq!(doc.spec.type_, "NodePort");
    }

    // =========================================================================
    // Story: StatefulSet Storage
    // =========================================================================

    #[test]
    fn story_stateful_set_storage_preserved_verbatim() {
        let s = StatefulSetResource::new("db", "postgres:16")
            .with_port(5432)
            .with_storage("20Gi");
        let doc = ManifestCompiler::compile_stateful_set(&s).unwrap();

        assert_eq!(doc.spec.service_name, "db");
        assert_eq!(doc.spec.volume_claim_templates.len(), 1);
        let claim = &doc.spec.volume_claim_templates[0];
        assert_eq!(claim.metadata.name, "db-storage");
        assert_eq!(claim.spec.resources.requests.storage, "20Gi");
        assert_eq!(claim.spec.access_modes, vec!["ReadWriteOnce".to_string()]);
        assert_eq!(claim.spec.storage_class_name, "standard");

        let mount = &doc.spec.template.spec.containers[0].volume_mounts[0];
        assert_eq!(mount.name, "db-storage");
        assert_eq!(mount.mount_path, "/var/lib/data");
    }

    // =========================================================================
    // Story: ConfigMap and Secret Data
    // =========================================================================

    #[test]
    fn story_config_map_data_emitted_as_is() {
        let cm = ConfigMapResource::new("cfg").with_entry("LOG_LEVEL", "info");
        let doc = ManifestCompiler::compile_config_map(&cm).unwrap();
        assert_eq!(doc.api_version, "v1");
        assert_eq!(doc.data.get("LOG_LEVEL"), Some(&"info".to_string()));
    }

    #[test]
    fn story_secret_round_trips_through_base64() {
        let secret = SecretResource::new("db-creds")
            .with_entry("username", "admin")
            .with_entry("password", "p@ss wörd\n")
            .with_entry("empty", "");
        let doc = ManifestCompiler::compile_secret(&secret).unwrap();

        assert_eq!(doc.type_, "Opaque");
        assert_ne!(doc.data["username"], "admin");

        let engine = base64::engine::general_purpose::STANDARD;
        let decoded: BTreeMap<String, String> = doc
            .data
            .iter()
            .map(|(k, v)| {
                let bytes = engine.decode(v).unwrap();
                (k.clone(), String::from_utf8(bytes).unwrap())
            })
            .collect();
        assert_eq!(decoded, secret.data);
    }

    #[test]
    fn story_secret_object_keeps_plaintext_after_compile() {
        let secret = SecretResource::new("s").with_entry("token", "abc");
        ManifestCompiler::compile_secret(&secret).unwrap();
        assert_eq!(secret.data["token"], "abc");
    }

    // =========================================================================
    // Story: HorizontalPodAutoscaler
    // =========================================================================

    #[test]
    fn story_hpa_has_one_cpu_metric() {
        let d = DeploymentResource::new("web", "nginx").shared();
        let hpa = HpaResource::new("web-hpa", &d, 2, 6).unwrap();
        let doc = ManifestCompiler::compile_hpa(&hpa).unwrap();

        assert_eq!(doc.api_version, "autoscaling/v2");
        assert_eq!(doc.spec.scale_target_ref.kind, "Deployment");
        assert_eq!(doc.spec.scale_target_ref.name, "web");
        assert_eq!(doc.spec.scale_target_ref.api_version, "apps/v1");
        assert_eq!(doc.spec.metrics.len(), 1);
        assert_eq!(doc.spec.metrics[0].resource.name, "cpu");
        assert_eq!(doc.spec.metrics[0].resource.target.average_utilization, 80);
    }

    #[test]
    fn story_hpa_on_stateful_set_targets_stateful_set() {
        let s = StatefulSetResource::new("db", "postgres:16").shared();
        let hpa = HpaResource::new("db-hpa", &s, 1, 3).unwrap();
        let doc = ManifestCompiler::compile_hpa(&hpa).unwrap();
        assert_eq!(doc.spec.scale_target_ref.kind, "StatefulSet");
    }

    #[test]
    fn story_hpa_mutated_into_inconsistency_fails() {
        let hpa = HpaResource::new("web-hpa", "web", 1, 4).unwrap().shared();
        hpa.write().min_replicas = 9;

        let err = ManifestCompiler::compile(&Resource::from(&hpa)).unwrap_err();
        assert!(err.to_string().contains("minReplicas (9) must not exceed maxReplicas (4)"));
    }

    // =========================================================================
    // Story: Multi-Document Stream
    // =========================================================================

    #[test]
    fn story_stream_keeps_order_and_separators() {
        let d = DeploymentResource::new("web", "nginx").shared();
        let resources = vec![
            Resource::from(&d),
            ServiceResource::new("web-service", &d).into(),
            ConfigMapResource::new("web-config").into(),
        ];

        let docs = ManifestCompiler::compile_all(&resources).unwrap();
        let stream = render_stream(&docs).unwrap();

        let parts: Vec<&str> = stream.split("---\n").collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].contains("kind: Deployment"));
        assert!(parts[1].contains("kind: Service"));
        assert!(parts[2].contains("kind: ConfigMap"));
    }

    #[test]
    fn empty_stream_renders_empty() {
        assert_eq!(render_stream(&[]).unwrap(), "");
    }

    #[test]
    fn compile_all_stops_at_first_invalid_resource() {
        let resources = vec![
            Resource::from(ConfigMapResource::new("ok")),
            Resource::from(DeploymentResource::new("Bad Name", "nginx")),
        ];
        let err = ManifestCompiler::compile_all(&resources).unwrap_err();
        assert_eq!(err.resource(), Some(("Deployment", "Bad Name")));
    }
}
