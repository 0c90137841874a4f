//! End-to-end tests for the deploy pipeline
//!
//! These tests tell the story of an operator describing an application in
//! Rust, compiling it, and handing it to kubectl. kubectl is replaced by a
//! recording runner, so no cluster is needed.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use kuber::deploy::{
    CommandOutput, CommandRunner, DeployConfig, DeployMode, DeployPhase, Orchestrator,
};
use kuber::graph::{self, DatabaseOptions, ResourceGraph, WebAppOptions};
use kuber::resource::{ConfigMap, Deployment, Resource, Secret, Service};
use kuber::Error;

// =============================================================================
// Test Fixtures
// =============================================================================

/// A runner that records every call and the stream kubectl would have read
struct RecordingRunner {
    exit_code: i32,
    stderr: String,
    calls: Mutex<Vec<(String, Vec<String>)>>,
    streams: Mutex<Vec<String>>,
}

impl RecordingRunner {
    fn succeeding() -> Self {
        Self::exiting(0, "")
    }

    fn exiting(exit_code: i32, stderr: &str) -> Self {
        Self {
            exit_code,
            stderr: stderr.to_string(),
            calls: Mutex::new(Vec::new()),
            streams: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[String]) -> kuber::Result<CommandOutput> {
        self.calls.lock().push((program.to_string(), args.to_vec()));

        if let Some(pos) = args.iter().position(|a| a == "-f") {
            let stream = std::fs::read_to_string(&args[pos + 1])
                .map_err(|e| Error::io("read applied stream", e))?;
            self.streams.lock().push(stream);
        }

        Ok(CommandOutput {
            exit_code: Some(self.exit_code),
            stdout: "configured\n".to_string(),
            stderr: self.stderr.clone(),
        })
    }
}

fn shop() -> ResourceGraph {
    let mut graph = ResourceGraph::new();
    graph.add(
        Secret::new("shop-secrets")
            .with_namespace("shop")
            .with_entry("api_key", "super-secret-key"),
    );
    graph.extend(
        graph::web_app(
            "storefront",
            "shop/storefront:1.4",
            WebAppOptions {
                replicas: 2,
                port: 8080,
                namespace: Some("shop".to_string()),
                ..WebAppOptions::default()
            },
        )
        .unwrap()
        .resources(),
    );
    graph.extend(
        graph::database(
            "orders-db",
            "postgres:16",
            "20Gi",
            DatabaseOptions {
                port: Some(5432),
                namespace: Some("shop".to_string()),
                ..DatabaseOptions::default()
            },
        )
        .resources(),
    );
    graph
}

// =============================================================================
// Story: Dry Run
// =============================================================================

/// An operator previews the whole stack without a cluster
#[test]
fn story_dry_run_previews_without_touching_the_cluster() {
    let runner = RecordingRunner::succeeding();
    let orchestrator = Orchestrator::with_runner(DeployConfig::default(), runner);

    let report = orchestrator
        .deploy(shop().resources(), DeployMode::DryRun)
        .unwrap();

    assert!(report.succeeded());
    assert_eq!(report.documents.len(), 6);
    let rendered = report.rendered.unwrap();
    assert!(rendered.contains("name: storefront-service"));
    assert!(rendered.contains("storage: 20Gi"));
    // Secrets are rendered encoded, never in plaintext
    assert!(!rendered.contains("super-secret-key"));
}

#[test]
fn story_dry_run_is_side_effect_free_even_with_namespace_provisioning() {
    let config = DeployConfig {
        ensure_namespaces: true,
        ..DeployConfig::default()
    };
    let runner = RecordingRunner::succeeding();
    let orchestrator = Orchestrator::with_runner(config, &runner);

    orchestrator
        .deploy(shop().resources(), DeployMode::DryRun)
        .unwrap();
    orchestrator.deploy(&[], DeployMode::DryRun).unwrap();

    assert_eq!(runner.call_count(), 0);
}

// =============================================================================
// Story: Apply
// =============================================================================

/// Three resources become exactly three documents in one apply
#[test]
fn story_apply_sends_three_documents_in_order_once() {
    let d = Deployment::new("web", "nginx:1.27").with_port(8080).shared();
    let resources = vec![
        Resource::from(&d),
        Service::new("web-service", &d).into(),
        ConfigMap::new("web-config").with_entry("MODE", "prod").into(),
    ];

    let runner = RecordingRunner::succeeding();
    let orchestrator = Orchestrator::with_runner(DeployConfig::default(), &runner);
    let report = orchestrator.deploy(&resources, DeployMode::Apply).unwrap();

    assert_eq!(report.tool_stdout.as_deref(), Some("configured\n"));
    assert_eq!(report.phase(), DeployPhase::Succeeded);
    assert_eq!(runner.call_count(), 1);

    let streams = runner.streams.lock();
    let docs: Vec<&str> = streams[0].split("---\n").collect();
    assert_eq!(docs.len(), 3);
    assert!(docs[0].contains("kind: Deployment"));
    assert!(docs[1].contains("targetPort: 8080"));
    assert!(docs[2].contains("MODE: prod"));
}

#[test]
fn story_apply_stream_matches_caller_order() {
    let runner = RecordingRunner::succeeding();
    let orchestrator = Orchestrator::with_runner(DeployConfig::default(), &runner);
    orchestrator
        .deploy(shop().resources(), DeployMode::Apply)
        .unwrap();

    assert_eq!(runner.call_count(), 1);
    let calls = runner.calls.lock();
    assert_eq!(calls[0].0, "kubectl");
    assert_eq!(calls[0].1[..2], ["apply", "-f"]);

    let streams = runner.streams.lock();
    let kinds: Vec<&str> = streams[0]
        .split("---\n")
        .map(|doc| {
            doc.lines()
                .find_map(|line| line.strip_prefix("kind: "))
                .unwrap_or_default()
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "Secret",
            "Deployment",
            "Service",
            "HorizontalPodAutoscaler",
            "StatefulSet",
            "Service"
        ]
    );
}

#[test]
fn story_namespaces_are_provisioned_when_asked() {
    // Every probe exits 1, so "shop" is treated as missing
    let runner = RecordingRunner::exiting(1, "");
    let config = DeployConfig {
        ensure_namespaces: true,
        ..DeployConfig::default()
    };
    let orchestrator = Orchestrator::with_runner(config, &runner);

    // The apply itself also exits 1 with this runner
    let err = orchestrator
        .deploy(shop().resources(), DeployMode::Apply)
        .unwrap_err();
    assert!(matches!(err, Error::Apply { .. }));

    // One probe for "shop", then one apply whose stream starts with the Namespace
    assert_eq!(runner.call_count(), 2);
    assert_eq!(runner.calls.lock()[0].1, ["get", "namespace", "shop"]);
    let streams = runner.streams.lock();
    assert!(streams[0].starts_with("apiVersion: v1\nkind: Namespace\n"));
}

// =============================================================================
// Story: Failure
// =============================================================================

#[test]
fn story_failed_apply_surfaces_stderr() {
    let runner = RecordingRunner::exiting(1, "error: unable to recognize \"stream\"");
    let orchestrator = Orchestrator::with_runner(DeployConfig::default(), &runner);

    let err = orchestrator
        .deploy(shop().resources(), DeployMode::Apply)
        .unwrap_err();

    assert!(err.to_string().contains("unable to recognize"));
    assert!(!err.is_user_fixable());
    assert_eq!(runner.call_count(), 1);
}

#[test]
fn story_invalid_input_fails_before_kubectl_runs() {
    let mut labels = BTreeMap::new();
    labels.insert("team".to_string(), "shop".to_string());
    let bad = Deployment::new("web", "nginx").with_labels(labels).shared();
    bad.write().replicas = -3;

    let runner = RecordingRunner::succeeding();
    let orchestrator = Orchestrator::with_runner(DeployConfig::default(), &runner);
    let err = orchestrator
        .deploy(&[Resource::from(&bad)], DeployMode::Apply)
        .unwrap_err();

    assert!(err.is_user_fixable());
    assert_eq!(err.resource(), Some(("Deployment", "web")));
    assert_eq!(runner.call_count(), 0);
}
