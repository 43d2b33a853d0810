use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use antecedent_backend::DynConnector;
use antecedent_backend_http::HttpConnector;
use antecedent_core::{
    OwnershipVerifier, OwnershipWriter, ReleaseManifest, ResourceDescriptor, ResourceId, decompose,
};
use antecedent_cli::config::AppConfig;
use serde_json::Value;

use crate::cli::{DecomposeArgs, ReleaseArgs};
use crate::output::{print_json, print_report, print_status};

fn read_manifest(path: &Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read manifest from stdin")?;
            Ok(buf)
        }
    }
}

fn connector(cfg: &AppConfig) -> DynConnector {
    Arc::new(HttpConnector::new(cfg.connection.clone()))
}

fn parse_release(args: &ReleaseArgs) -> Result<(ReleaseManifest, ResourceId)> {
    let id: ResourceId = args
        .release_id
        .parse()
        .with_context(|| format!("Invalid release id: {}", args.release_id))?;
    let manifest = read_manifest(&args.manifest)?;
    Ok((ReleaseManifest::new(manifest, args.namespace.clone()), id))
}

pub fn decompose_manifest(args: &DecomposeArgs) -> Result<()> {
    let manifest = read_manifest(&args.manifest)?;
    let descriptors = match &args.namespace {
        Some(ns) => ReleaseManifest::new(manifest, ns.clone()).descriptors(),
        None => decompose(&manifest),
    };
    let values: Vec<Value> = descriptors
        .into_iter()
        .map(ResourceDescriptor::into_value)
        .collect();
    print_json(&Value::Array(values))
}

/// Returns whether the release may adopt its resources.
pub async fn verify(cfg: &AppConfig, args: &ReleaseArgs) -> Result<bool> {
    let (release, id) = parse_release(args)?;
    let status = OwnershipVerifier::new(connector(cfg))
        .with_retry_policy(cfg.retry.to_policy())
        .verify(&release, &id)
        .await
        .context("Ownership verification failed")?;
    tracing::info!(
        release = %id,
        owner = status.annotation_value(),
        owned = status.is_owned_by_expected(),
        "Verified release ownership"
    );
    print_status(&status, &id);
    Ok(status.is_owned_by_expected())
}

pub async fn claim(cfg: &AppConfig, args: &ReleaseArgs) -> Result<()> {
    let (release, id) = parse_release(args)?;
    let report = OwnershipWriter::new(connector(cfg))
        .claim(&release, &id)
        .await
        .context("Claiming release resources failed")?;
    print_report(&report);
    Ok(())
}
