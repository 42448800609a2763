use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use fluxq_api::wire::{Condition, HelmRelease, Kustomization};
use fluxq_api::{
    FluxQueryApi, GetHelmReleaseRequest, GetKustomizationRequest, InProcApi, ListHelmReleasesRequest,
    ListKustomizationsRequest, Status,
};
use fluxq_core::ResourceKind;
use fluxq_kubehub::KubeBackend;
use serde::Serialize;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "fluxqctl", version, about = "Query Flux Kustomizations and HelmReleases")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Namespace to query (lists default to all namespaces, gets to "default")
    #[arg(long = "ns", short = 'n', global = true, env = "FLUXQ_NAMESPACE")]
    namespace: Option<String>,

    /// List across all namespaces, ignoring --ns
    #[arg(short = 'A', long = "all-namespaces", global = true, action = ArgAction::SetTrue)]
    all_namespaces: bool,

    /// Kubeconfig context (default: current context)
    #[arg(long = "context", global = true, env = "FLUXQ_CONTEXT")]
    context: Option<String>,

    /// Abandon the request after this many seconds
    #[arg(long = "timeout-secs", global = true, env = "FLUXQ_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json, Yaml }

#[derive(Subcommand, Debug)]
enum Commands {
    /// List Kustomizations, or get one by name
    #[command(alias = "ks", alias = "kustomization")]
    Kustomizations {
        name: Option<String>,
    },
    /// List HelmReleases, or get one by name
    #[command(alias = "hr", alias = "helmrelease")]
    Helmreleases {
        name: Option<String>,
    },
    /// List or get by kind name, e.g. `get hr podinfo`
    Get {
        kind: String,
        name: Option<String>,
    },
    /// Print the supported kinds
    Kinds,
}

const DEFAULT_LOG: &str = "info";

/// Filter directive from `FLUXQ_LOG`, falling back to `info`.
fn log_directive(var: Option<String>) -> String {
    var.filter(|v| !v.trim().is_empty()).unwrap_or_else(|| DEFAULT_LOG.to_string())
}

fn init_tracing() {
    let env = log_directive(std::env::var("FLUXQ_LOG").ok());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("FLUXQ_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid FLUXQ_METRICS_ADDR; expected host:port");
        }
    }
}

/// Namespace for a list call: empty means all namespaces.
fn list_namespace(cli: &Cli) -> String {
    if cli.all_namespaces { String::new() } else { cli.namespace.clone().unwrap_or_default() }
}

fn get_namespace(cli: &Cli) -> String {
    cli.namespace.clone().unwrap_or_else(|| "default".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    if let Commands::Kinds = cli.command {
        for k in ResourceKind::ALL {
            println!("{:<14} {:<4} {}", k.kind(), k.short_name(), k.gvk_key());
        }
        return Ok(());
    }

    let backend = KubeBackend::from_context(cli.context.as_deref()).await?;
    let api = InProcApi::new(Arc::new(backend));
    let deadline = Duration::from_secs(cli.timeout_secs.max(1));

    // Dropping the call on timeout abandons the in-flight API server request.
    let outcome = tokio::time::timeout(deadline, run(&cli, &api)).await;
    match outcome {
        Ok(Ok(text)) => {
            print!("{}", text);
            Ok(())
        }
        Ok(Err(status)) => {
            error!(code = %status.code(), error = %status.message(), "request failed");
            eprintln!("error: {}", status);
            std::process::exit(1);
        }
        Err(_) => Err(anyhow!("request timed out after {}s", deadline.as_secs())),
    }
}

/// Resolve `get KIND [NAME]` into the typed subcommand.
fn resolve(command: &Commands) -> Result<(ResourceKind, Option<String>), Status> {
    match command {
        Commands::Kustomizations { name } => Ok((ResourceKind::Kustomization, name.clone())),
        Commands::Helmreleases { name } => Ok((ResourceKind::HelmRelease, name.clone())),
        Commands::Get { kind, name } => ResourceKind::parse(kind)
            .map(|k| (k, name.clone()))
            .ok_or_else(|| Status::invalid_argument(format!("unknown kind {:?}", kind))),
        Commands::Kinds => Err(Status::invalid_argument("kinds takes no query")),
    }
}

async fn run(cli: &Cli, api: &dyn FluxQueryApi) -> Result<String, Status> {
    match resolve(&cli.command)? {
        (ResourceKind::Kustomization, None) => {
            let namespace = list_namespace(cli);
            info!(ns = %namespace, "kustomizations list invoked");
            let res = api.list_kustomizations(ListKustomizationsRequest { namespace }).await?;
            render(cli.output, &res, || kustomization_table(&res.kustomizations))
        }
        (ResourceKind::Kustomization, Some(name)) => {
            let req = GetKustomizationRequest { namespace: get_namespace(cli), name };
            info!(ns = %req.namespace, name = %req.name, "kustomization get invoked");
            let res = api.get_kustomization(req).await?;
            render(cli.output, &res, || kustomization_table(std::slice::from_ref(&res.kustomization)))
        }
        (ResourceKind::HelmRelease, None) => {
            let namespace = list_namespace(cli);
            info!(ns = %namespace, "helmreleases list invoked");
            let res = api.list_helm_releases(ListHelmReleasesRequest { namespace }).await?;
            render(cli.output, &res, || helm_release_table(&res.helm_releases))
        }
        (ResourceKind::HelmRelease, Some(name)) => {
            let req = GetHelmReleaseRequest { namespace: get_namespace(cli), name };
            info!(ns = %req.namespace, name = %req.name, "helmrelease get invoked");
            let res = api.get_helm_release(req).await?;
            render(cli.output, &res, || helm_release_table(std::slice::from_ref(&res.helm_release)))
        }
    }
}

fn render<T: Serialize>(output: Output, value: &T, human: impl FnOnce() -> String) -> Result<String, Status> {
    match output {
        Output::Human => Ok(human()),
        Output::Json => serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .map_err(|e| Status::internal(format!("encoding json: {}", e))),
        Output::Yaml => serde_yaml::to_string(value).map_err(|e| Status::internal(format!("encoding yaml: {}", e))),
    }
}

fn ready(conditions: &[Condition]) -> &str {
    conditions.iter().find(|c| c.type_ == "Ready").map(|c| c.status.as_str()).unwrap_or("Unknown")
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

fn kustomization_table(items: &[Kustomization]) -> String {
    let mut out = format!("{:<20} {:<24} {:<8} {:<28} {}\n", "NAMESPACE", "NAME", "READY", "REVISION", "SOURCE");
    for k in items {
        let source = format!("{}/{}", k.source_ref.kind, k.source_ref.name);
        let state = if k.suspended { "Suspended" } else { ready(&k.conditions) };
        out.push_str(&format!("{:<20} {:<24} {:<8} {:<28} {}\n", k.namespace, k.name, state, or_dash(&k.last_applied_revision), source));
    }
    out
}

fn helm_release_table(items: &[HelmRelease]) -> String {
    let mut out = format!("{:<20} {:<24} {:<8} {:<28} {}\n", "NAMESPACE", "NAME", "READY", "REVISION", "CHART");
    for h in items {
        let src = &h.helm_chart.source_ref;
        let chart = format!("{}/{} ({})", src.kind, src.name, or_dash(&h.helm_chart.chart));
        let state = if h.suspended { "Suspended" } else { ready(&h.conditions) };
        out.push_str(&format!("{:<20} {:<24} {:<8} {:<28} {}\n", h.namespace, h.name, state, or_dash(&h.last_applied_revision), chart));
    }
    out
}
