//! Deployment Orchestrator
//!
//! Compiles an ordered collection of resources and either renders the
//! documents (dry-run) or applies them with a single `kubectl apply -f`.
//!
//! # Phases
//!
//! ```text
//! Idle -> Compiling -> Rendering              -> Succeeded | Failed   (dry-run)
//!                   -> Serializing -> Invoking -> Succeeded | Failed   (apply)
//!                   -> Succeeded | Failed                              (compile-only)
//! ```
//!
//! Apply is not atomic. kubectl may create objects from the start of the
//! stream before rejecting a later one, and a failure names no resource.
//! Nothing is retried.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

#[cfg(test)]
use mockall::automock;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::compiler::{render_stream, ManifestCompiler};
use crate::resource::Resource;
use crate::workload::{Manifest, Namespace};
use crate::{Error, Result, DEFAULT_NAMESPACE};

/// Default cluster tool
pub const DEFAULT_KUBECTL: &str = "kubectl";

// =============================================================================
// Command runner
// =============================================================================

/// Captured result of an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Trait for executing external commands (allows mocking in tests)
///
/// Commands are always an argument vector, never shell text.
#[cfg_attr(test, automock)]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion and capture its output
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Real command runner that executes actual system commands
#[derive(Default, Clone)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args);

        debug!(command = ?cmd, "Executing command");

        let output = cmd.output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::tool_not_found(program),
            _ => Error::io(format!("run {program}"), e),
        })?;

        Ok(CommandOutput::from(output))
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// What a deploy call does after compiling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployMode {
    /// Render the documents; never contact the cluster
    DryRun,
    /// Apply the documents with kubectl
    Apply,
    /// Only compile and validate
    CompileOnly,
}

/// How the orchestrator reaches the cluster
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployConfig {
    /// kubectl binary name or path
    pub kubectl: String,
    /// `--kubeconfig` passed to every kubectl call
    pub kubeconfig: Option<String>,
    /// `--context` passed to every kubectl call
    pub context: Option<String>,
    /// Create missing non-default namespaces as part of the apply
    pub ensure_namespaces: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            kubectl: DEFAULT_KUBECTL.to_string(),
            kubeconfig: None,
            context: None,
            ensure_namespaces: false,
        }
    }
}

impl DeployConfig {
    /// Global kubectl flags shared by every invocation
    fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(kubeconfig) = &self.kubeconfig {
            args.push("--kubeconfig".to_string());
            args.push(kubeconfig.clone());
        }
        if let Some(context) = &self.context {
            args.push("--context".to_string());
            args.push(context.clone());
        }
        args
    }
}

// =============================================================================
// Phases
// =============================================================================

/// Where a deploy call is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployPhase {
    /// Nothing done yet
    Idle,
    /// Compiling resources into documents
    Compiling,
    /// Rendering documents for inspection (dry-run)
    Rendering,
    /// Writing the multi-document stream (apply)
    Serializing,
    /// Waiting on kubectl (apply)
    Invoking,
    /// Terminal: the call succeeded
    Succeeded,
    /// Terminal: the call failed
    Failed,
}

impl DeployPhase {
    /// Whether `next` may follow this phase
    pub fn can_transition_to(self, next: DeployPhase) -> bool {
        use DeployPhase::*;
        matches!(
            (self, next),
            (Idle, Compiling)
                | (Compiling, Rendering | Serializing | Succeeded | Failed)
                | (Rendering, Succeeded | Failed)
                | (Serializing, Invoking | Failed)
                | (Invoking, Succeeded | Failed)
        )
    }

    /// Whether the phase ends the call
    pub fn is_terminal(self) -> bool {
        matches!(self, DeployPhase::Succeeded | DeployPhase::Failed)
    }
}

impl std::fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeployPhase::Idle => "Idle",
            DeployPhase::Compiling => "Compiling",
            DeployPhase::Rendering => "Rendering",
            DeployPhase::Serializing => "Serializing",
            DeployPhase::Invoking => "Invoking",
            DeployPhase::Succeeded => "Succeeded",
            DeployPhase::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// Records the phases one call walks through
#[derive(Debug)]
struct PhaseLog {
    phases: Vec<DeployPhase>,
}

impl PhaseLog {
    fn new() -> Self {
        Self {
            phases: vec![DeployPhase::Idle],
        }
    }

    fn current(&self) -> DeployPhase {
        self.phases.last().copied().unwrap_or(DeployPhase::Idle)
    }

    fn advance(&mut self, next: DeployPhase) {
        debug_assert!(
            self.current().can_transition_to(next),
            "invalid deploy transition {} -> {}",
            self.current(),
            next
        );
        debug!(phase = %next, "deploy phase");
        self.phases.push(next);
    }

    /// Mark the call failed and pass the error through
    fn fail(&mut self, err: Error) -> Error {
        self.advance(DeployPhase::Failed);
        warn!(error = %err, "deploy failed");
        err
    }
}

// =============================================================================
// Report
// =============================================================================

/// Outcome of a successful deploy call
#[derive(Clone, Debug)]
pub struct DeployReport {
    /// Mode the call ran in
    pub mode: DeployMode,
    /// Compiled documents, in caller order (without provisioned namespaces)
    pub documents: Vec<Manifest>,
    /// The rendered stream (dry-run only)
    pub rendered: Option<String>,
    /// Namespaces prepended to the applied stream
    pub created_namespaces: Vec<String>,
    /// What kubectl printed on success (apply only)
    pub tool_stdout: Option<String>,
    /// Phases walked, from `Idle` to `Succeeded`
    pub phases: Vec<DeployPhase>,
}

impl DeployReport {
    /// Final phase of the call
    pub fn phase(&self) -> DeployPhase {
        self.phases.last().copied().unwrap_or(DeployPhase::Idle)
    }

    /// Whether the call succeeded
    pub fn succeeded(&self) -> bool {
        self.phase() == DeployPhase::Succeeded
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Drives compilation and the external apply for one collection at a time
///
/// Each call is independent: no state is kept between calls.
pub struct Orchestrator<R: CommandRunner = RealCommandRunner> {
    config: DeployConfig,
    runner: R,
}

impl Orchestrator<RealCommandRunner> {
    /// Create an orchestrator that runs the real kubectl
    pub fn new(config: DeployConfig) -> Self {
        Self {
            config,
            runner: RealCommandRunner,
        }
    }
}

impl Default for Orchestrator<RealCommandRunner> {
    fn default() -> Self {
        Self::new(DeployConfig::default())
    }
}

impl<R: CommandRunner> Orchestrator<R> {
    /// Create an orchestrator with a custom command runner
    pub fn with_runner(config: DeployConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Configuration in use
    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Compile `resources` in order, then render or apply them
    ///
    /// Dry-run and compile-only calls never run an external command.
    pub fn deploy(&self, resources: &[Resource], mode: DeployMode) -> Result<DeployReport> {
        self.deploy_with_phases(resources, mode).1
    }

    /// Like [`deploy`](Self::deploy), also returning the phases walked
    ///
    /// On failure the phases end in `Failed`, right after the phase that
    /// failed.
    pub fn deploy_with_phases(
        &self,
        resources: &[Resource],
        mode: DeployMode,
    ) -> (Vec<DeployPhase>, Result<DeployReport>) {
        let mut log = PhaseLog::new();
        let result = self.run_phases(&mut log, resources, mode);
        (log.phases, result)
    }

    fn run_phases(
        &self,
        log: &mut PhaseLog,
        resources: &[Resource],
        mode: DeployMode,
    ) -> Result<DeployReport> {
        info!(resources = resources.len(), ?mode, "Deploying resources");

        log.advance(DeployPhase::Compiling);
        let documents = ManifestCompiler::compile_all(resources).map_err(|e| log.fail(e))?;
        for doc in &documents {
            info!(kind = doc.kind(), name = doc.name(), "compiled");
        }

        let mut report = DeployReport {
            mode,
            documents,
            rendered: None,
            created_namespaces: Vec::new(),
            tool_stdout: None,
            phases: Vec::new(),
        };

        match mode {
            DeployMode::CompileOnly => {}
            DeployMode::DryRun => {
                log.advance(DeployPhase::Rendering);
                let rendered = render_stream(&report.documents).map_err(|e| log.fail(e))?;
                report.rendered = Some(rendered);
            }
            DeployMode::Apply => {
                log.advance(DeployPhase::Serializing);
                let namespaces = if self.config.ensure_namespaces {
                    self.missing_namespaces(&report.documents)
                } else {
                    Vec::new()
                };

                let stream = namespaces
                    .iter()
                    .map(|ns| Manifest::Namespace(Namespace::new(ns.as_str())))
                    .chain(report.documents.iter().cloned())
                    .collect::<Vec<_>>();
                let stream = render_stream(&stream).map_err(|e| log.fail(e))?;
                let file = write_stream(&stream).map_err(|e| log.fail(e))?;

                log.advance(DeployPhase::Invoking);
                let stdout = self.apply_file(file.path()).map_err(|e| log.fail(e))?;
                report.created_namespaces = namespaces;
                report.tool_stdout = Some(stdout);
            }
        }

        log.advance(DeployPhase::Succeeded);
        info!(documents = report.documents.len(), ?mode, "Deployment successful");
        report.phases = log.phases.clone();
        Ok(report)
    }

    /// Run `kubectl apply -f` once on the written stream
    fn apply_file(&self, path: &Path) -> Result<String> {
        let mut args = self.config.global_args();
        args.extend([
            "apply".to_string(),
            "-f".to_string(),
            path.to_string_lossy().into_owned(),
        ]);

        let output = self.runner.run(&self.config.kubectl, &args)?;
        if !output.success() {
            return Err(Error::apply(output.exit_code, output.stdout, output.stderr));
        }
        Ok(output.stdout)
    }

    /// Non-default namespaces the documents use that the cluster lacks
    ///
    /// The existence probe is optional work: any probe failure counts as
    /// "missing" and the Namespace is created.
    fn missing_namespaces(&self, documents: &[Manifest]) -> Vec<String> {
        let mut seen: Vec<&str> = Vec::new();
        for ns in documents.iter().filter_map(Manifest::namespace) {
            if ns != DEFAULT_NAMESPACE && !seen.contains(&ns) {
                seen.push(ns);
            }
        }

        seen.into_iter()
            .filter(|ns| !self.namespace_exists(ns))
            .map(str::to_string)
            .collect()
    }

    fn namespace_exists(&self, namespace: &str) -> bool {
        let mut args = self.config.global_args();
        args.extend([
            "get".to_string(),
            "namespace".to_string(),
            namespace.to_string(),
        ]);

        match self.runner.run(&self.config.kubectl, &args) {
            Ok(output) if output.success() => {
                debug!(namespace, "namespace exists");
                true
            }
            Ok(_) => {
                info!(namespace, "namespace missing, will create");
                false
            }
            Err(e) => {
                warn!(namespace, error = %e, "namespace probe failed, will create");
                false
            }
        }
    }
}

/// Write the stream to a transient file, removed when the handle drops
fn write_stream(stream: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("kuber-")
        .suffix(".yaml")
        .tempfile()
        .map_err(|e| Error::io("create manifest file", e))?;
    file.write_all(stream.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| Error::io("write manifest stream", e))?;
    Ok(file)
}

/// Deploy with the default configuration and the real kubectl
pub fn deploy(resources: &[Resource], mode: DeployMode) -> Result<DeployReport> {
    Orchestrator::default().deploy(resources, mode)
}
