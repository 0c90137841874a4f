//! Kuber CLI - compile stack files into manifests and apply them with kubectl

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kuber::deploy::{DeployConfig, DeployMode, Orchestrator, DEFAULT_KUBECTL};
use kuber::stack;

/// Kuber - typed Kubernetes resources compiled to manifests and applied with kubectl
#[derive(Parser, Debug)]
#[command(name = "kuber", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a stack file and print the multi-document YAML stream
    ///
    /// Never contacts a cluster.
    Render(RenderArgs),

    /// Compile a stack file and apply it with a single `kubectl apply -f`
    ///
    /// Apply is not atomic: if kubectl rejects a document, objects earlier in
    /// the stream may already have been created.
    Apply(ApplyArgs),
}

/// Render mode arguments
#[derive(Args, Debug)]
struct RenderArgs {
    /// Path to the stack file
    #[arg(short = 'f', long = "file")]
    file: PathBuf,
}

/// Apply mode arguments
#[derive(Args, Debug)]
struct ApplyArgs {
    /// Path to the stack file
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Print what would be applied instead of applying it
    #[arg(long)]
    dry_run: bool,

    /// kubectl binary name or path
    #[arg(long, env = "KUBER_KUBECTL", default_value = DEFAULT_KUBECTL)]
    kubectl: String,

    /// Path to the kubeconfig passed to kubectl
    #[arg(long, env = "KUBER_KUBECONFIG")]
    kubeconfig: Option<String>,

    /// kubeconfig context passed to kubectl
    #[arg(long)]
    context: Option<String>,

    /// Create namespaces used by the stack that don't exist yet
    #[arg(long)]
    ensure_namespaces: bool,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so rendered YAML on stdout stays clean
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => {
            let graph = stack::load_graph(&args.file)?;
            let report = Orchestrator::default().deploy(graph.resources(), DeployMode::DryRun)?;
            print_stdout(report.rendered.as_deref().unwrap_or_default())?;
        }
        Commands::Apply(args) => {
            let graph = stack::load_graph(&args.file)?;
            let config = DeployConfig {
                kubectl: args.kubectl,
                kubeconfig: args.kubeconfig,
                context: args.context,
                ensure_namespaces: args.ensure_namespaces,
            };
            let mode = if args.dry_run {
                DeployMode::DryRun
            } else {
                DeployMode::Apply
            };

            let report = Orchestrator::new(config).deploy(graph.resources(), mode)?;
            let output = match mode {
                DeployMode::DryRun => report.rendered,
                _ => report.tool_stdout,
            };
            print_stdout(output.as_deref().unwrap_or_default())?;
        }
    }

    Ok(())
}

fn print_stdout(text: &str) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
