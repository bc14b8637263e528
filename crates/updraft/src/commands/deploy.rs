//! Deploy command

use crate::cli::DeployArgs;
use crate::commands::load_config;
use crate::output;
use anyhow::{bail, Context, Result};
use camino::Utf8Path;
use std::fs;
use updraft_core::Manifest;
use updraft_store::{open_object_store, Deployer};

pub async fn run(args: DeployArgs, config_file: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_file)?;
    let raw = fs::read_to_string(&args.manifest)
        .with_context(|| format!("Failed to read {}", args.manifest))?;
    let manifest = Manifest::from_json(&raw)
        .with_context(|| format!("Failed to parse {}", args.manifest))?;
    manifest.validate()?;

    let build_dir = args
        .build_dir
        .clone()
        .unwrap_or_else(|| config.builder.build_dir.clone());

    let store = open_object_store(&config.store, args.target.as_deref())
        .await
        .context("Failed to open object store")?;

    output::header(&format!("Deploy {} to {}", manifest.version, store.name()));
    output::kv("Build dir", build_dir.as_str());
    output::kv("Files", &manifest.file_count.to_string());
    output::kv("Total size", &output::format_size(manifest.total_size));

    let pb = output::progress_bar(manifest.files.len() as u64, "uploading");
    let progress = pb.clone();
    let result = Deployer::new(store.as_ref())
        .on_file(move |entry| {
            progress.set_message(entry.path.clone());
            progress.inc(1);
        })
        .deploy(&manifest, build_dir.as_std_path())
        .await;
    pb.finish_and_clear();
    let report = result.context("Deploy failed")?;

    for failure in &report.failures {
        output::error(&format!("{}: {}", failure.path, failure.reason));
    }
    if !report.is_success() {
        bail!(
            "{} of {} files failed to deploy; manifest not uploaded",
            report.failures.len(),
            manifest.file_count
        );
    }

    output::success(&format!(
        "Uploaded {} objects for {} to {}",
        report.uploaded_count(),
        report.version,
        report.target
    ));
    Ok(())
}
