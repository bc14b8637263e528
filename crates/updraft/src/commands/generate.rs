//! Generate command

use crate::cli::GenerateArgs;
use crate::commands::load_config;
use crate::output;
use anyhow::{anyhow, bail, Context, Result};
use camino::Utf8Path;
use std::collections::BTreeMap;
use updraft_core::parse_version;
use updraft_manifest::{BuildOptions, KeyStore, ManifestBuilder};
use updraft_store::{write_atomic, ManifestStore};

pub fn run(args: GenerateArgs, config_file: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_file)?;
    let changelog = parse_changelog(&args.changelog)?;
    let build_dir = args
        .build_dir
        .clone()
        .unwrap_or_else(|| config.builder.build_dir.clone());

    output::header(&format!("Generate {} ({})", args.release, args.channel));
    output::kv("Build dir", build_dir.as_str());

    check_inputs(&build_dir, &args.release)?;

    let keys = KeyStore::new(config.signing.keys_dir.clone());
    let signer = keys
        .load_or_bootstrap(config.signing.key_bits)
        .with_context(|| format!("Failed to load signing key from {}", keys.dir()))?;

    let mut options = BuildOptions::from_config(&config).with_breaking(args.breaking_override());
    if let Some(base_url) = &args.base_url {
        options.base_url = base_url.clone();
    }

    let spinner = output::spinner("Hashing and signing build output...");
    let result = ManifestBuilder::new(options, signer).build(
        build_dir.as_std_path(),
        &args.release,
        args.channel,
        changelog,
    );
    spinner.finish_and_clear();
    let manifest = result.context("Failed to build manifest")?;

    output::kv("Files", &manifest.file_count.to_string());
    output::kv("Total size", &output::format_size(manifest.total_size));
    output::kv(
        "Critical",
        &manifest.files.iter().filter(|f| f.critical).count().to_string(),
    );
    output::kv("Min compatible", &manifest.min_compatible_version);
    output::kv("Breaking", &manifest.breaking.to_string());

    match &args.output {
        Some(path) => {
            write_manifest(path, &manifest.to_json()?)?;
            output::success(&format!("Manifest written to {}", path));
        }
        None => {
            let store = ManifestStore::new(config.manifests.dir.as_std_path());
            let published = store
                .publish(&manifest, args.force)
                .context("Failed to publish manifest")?;
            if let Some(previous) = &published.replaced {
                output::info(&format!("Replaced {} on {}", previous, published.channel));
            }
            output::success(&format!(
                "Published {} to {} ({})",
                published.version,
                published.channel,
                published.path.display()
            ));
        }
    }

    Ok(())
}

/// Reject a bad version or build directory before a key pair can be bootstrapped.
fn check_inputs(build_dir: &Utf8Path, version: &str) -> Result<()> {
    parse_version(version)?;
    if !build_dir.is_dir() {
        bail!("Build directory not found: {}", build_dir);
    }
    Ok(())
}

fn write_manifest(path: &Utf8Path, json: &str) -> Result<()> {
    write_atomic(path.as_std_path(), json.as_bytes())
        .with_context(|| format!("Failed to write {}", path))
}

/// Parse repeated `LOCALE=TEXT` flags. No flags means the builder's default entry.
fn parse_changelog(entries: &[String]) -> Result<Option<BTreeMap<String, String>>> {
    if entries.is_empty() {
        return Ok(None);
    }

    let mut changelog = BTreeMap::new();
    for entry in entries {
        let (locale, text) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid changelog entry '{}': expected LOCALE=TEXT", entry))?;
        let locale = locale.trim();
        if locale.is_empty() {
            return Err(anyhow!("Changelog entry '{}' has an empty locale", entry));
        }
        changelog.insert(locale.to_string(), text.trim().to_string());
    }
    Ok(Some(changelog))
}
