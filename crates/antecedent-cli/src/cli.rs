use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "antecedent")]
#[command(about = "Verify and claim release ownership of cluster resources")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file (defaults to ./antecedent.toml if present)
    #[arg(short, long, global = true, env = "ANTECEDENT_CONFIG")]
    pub config: Option<String>,

    /// API server base URL (overrides config)
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Log level (overrides config and is itself overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a manifest into resource descriptors and print them as JSON
    Decompose(DecomposeArgs),
    /// Check which release, if any, owns a manifest's resources
    Verify(ReleaseArgs),
    /// Annotate a manifest's resources with a release id
    Claim(ReleaseArgs),
}

#[derive(clap::Args)]
pub struct DecomposeArgs {
    /// Path to the manifest (reads from stdin if omitted)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
    /// Namespace applied to resources that name none
    #[arg(short, long)]
    pub namespace: Option<String>,
}

#[derive(clap::Args)]
pub struct ReleaseArgs {
    /// Path to the manifest (reads from stdin if omitted)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
    /// Release namespace, applied to resources that name none
    #[arg(short, long)]
    pub namespace: String,
    /// Release id, e.g. flux-system:helmrelease/podinfo
    #[arg(short, long)]
    pub release_id: String,
}
