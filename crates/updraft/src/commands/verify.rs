//! Verify command

use crate::cli::VerifyArgs;
use crate::commands::{load_config, load_trusted_key, public_key_path};
use crate::output;
use anyhow::{bail, Context, Result};
use camino::Utf8Path;
use std::fs;
use updraft_manifest::{artifact_path, verify_file, VerifiedManifest};

pub fn run(args: VerifyArgs, config_file: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_file)?;
    let key_path = public_key_path(args.public_key.clone(), &config);
    let key = load_trusted_key(Some(key_path.clone()), &config)?;

    let raw = fs::read_to_string(&args.manifest)
        .with_context(|| format!("Failed to read {}", args.manifest))?;

    output::header(&format!("Verify {}", args.manifest));
    output::kv("Public key", key_path.as_str());

    let manifest = VerifiedManifest::from_json(&raw, &key)?;
    output::success(&format!(
        "Signature valid for {} ({}, {} files)",
        manifest.version, manifest.channel, manifest.file_count
    ));

    let Some(build_dir) = &args.build_dir else {
        return Ok(());
    };

    let spinner = output::spinner("Checking file hashes...");
    let mut failures = Vec::new();
    for entry in &manifest.files {
        let result = match artifact_path(build_dir.as_std_path(), &entry.path) {
            Some(path) => verify_file(entry, &path).map_err(|e| e.to_string()),
            None => Err(format!("invalid path {}", entry.path)),
        };
        if let Err(reason) = result {
            failures.push(reason);
        }
    }
    spinner.finish_and_clear();

    for reason in &failures {
        output::error(reason);
    }
    if !failures.is_empty() {
        bail!(
            "{} of {} files do not match the manifest",
            failures.len(),
            manifest.file_count
        );
    }

    output::success(&format!(
        "All {} files in {} match the manifest",
        manifest.file_count, build_dir
    ));
    Ok(())
}
