//! Kuber - typed Kubernetes resources compiled to manifests and applied with kubectl
//!
//! Kuber lets an operator describe cluster objects as typed, composable Rust
//! values instead of hand-written YAML, compile them into API documents, and
//! hand the documents to `kubectl` as one multi-document stream.
//!
//! # Architecture
//!
//! Control flow runs leaves first:
//! - Resources are constructed (optionally through the graph builders)
//! - The orchestrator compiles each resource in caller order
//! - The documents are either rendered (dry-run) or applied in one `kubectl apply`
//!
//! Apply is not atomic: the cluster may accept earlier documents in the stream
//! before rejecting a later one.
//!
//! # Modules
//!
//! - [`resource`] - Resource model (Deployment, Service, StatefulSet, ConfigMap, Secret, HPA)
//! - [`workload`] - Kubernetes document types produced by compilation
//! - [`compiler`] - Manifest compiler and multi-document stream rendering
//! - [`graph`] - Builders for related resources (`service_for`, `web_app`, ...)
//! - [`deploy`] - Deployment orchestrator (dry-run vs. apply through kubectl)
//! - [`stack`] - Declarative stack files loaded by the CLI
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod compiler;
pub mod deploy;
pub mod error;
pub mod graph;
pub mod resource;
pub mod stack;
pub mod workload;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================

/// Namespace used when a resource does not name one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Label carrying the workload name; Services select on it
pub const LABEL_APP: &str = "app";

/// Label marking objects created by kuber
pub const LABEL_MANAGED_BY: &str = "managed-by";

/// Value of [`LABEL_MANAGED_BY`]
pub const MANAGED_BY_KUBER: &str = "kuber";

/// Label set to `"true"` on Deployments with auto-heal enabled
pub const LABEL_AUTO_HEAL: &str = "auto-heal";

/// Separator line between documents in a multi-document stream
pub const DOCUMENT_SEPARATOR: &str = "---";
