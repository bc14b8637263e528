//! Manifest Builder
//!
//! Turns a build output directory into a signed [`Manifest`]. The build
//! directory is only read; nothing is written until the caller persists the
//! returned manifest, so any failure leaves no partial output behind.

use crate::scan::{scan_build_dir, ScanOptions};
use crate::signer::ManifestSigner;
use chrono::{SubsecRound, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use updraft_core::{
    is_breaking, min_compatible_version, parse_version, BreakingRule, Channel, Error, Manifest,
    Result, UpdraftConfig,
};

/// Inputs to a build that come from configuration or CLI flags
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub scan: ScanOptions,

    /// Prefix for file URLs; `{base_url}/{version}/{path}`
    pub base_url: String,

    pub breaking_rule: BreakingRule,

    /// Locale used for the default changelog entry
    pub changelog_locale: String,

    /// Explicit `breaking` value overriding `breaking_rule`
    pub breaking_override: Option<bool>,
}

impl BuildOptions {
    pub fn from_config(config: &UpdraftConfig) -> Self {
        Self {
            scan: ScanOptions::new(
                &config.builder.critical_files,
                &config.builder.ignored_files,
            ),
            base_url: config.cdn.base_url.clone(),
            breaking_rule: config.builder.breaking_rule,
            changelog_locale: config.builder.changelog_locale.clone(),
            breaking_override: None,
        }
    }

    pub fn with_breaking(mut self, breaking: Option<bool>) -> Self {
        self.breaking_override = breaking;
        self
    }

    fn file_url(&self, version: &str, path: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), version, path)
    }
}

/// Scans, orders and signs build output
#[derive(Debug)]
pub struct ManifestBuilder {
    options: BuildOptions,
    signer: ManifestSigner,
}

impl ManifestBuilder {
    pub fn new(options: BuildOptions, signer: ManifestSigner) -> Self {
        Self { options, signer }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build a signed manifest for `version` on `channel`.
    ///
    /// # Errors
    ///
    /// `Error::Input` when `build_dir` is missing, not a directory, has no
    /// eligible files, or `version` is not `major.minor.patch`.
    pub fn build(
        &self,
        build_dir: &Path,
        version: &str,
        channel: Channel,
        changelog: Option<BTreeMap<String, String>>,
    ) -> Result<Manifest> {
        let parsed = parse_version(version)?;
        let version = parsed.to_string();

        if !build_dir.exists() {
            return Err(Error::input(format!(
                "Build directory not found: {}",
                build_dir.display()
            )));
        }
        if !build_dir.is_dir() {
            return Err(Error::input(format!(
                "Build path is not a directory: {}",
                build_dir.display()
            )));
        }

        info!(
            "Generating manifest for {} ({}) from {}",
            version,
            channel,
            build_dir.display()
        );

        let mut scanned = scan_build_dir(build_dir, &self.options.scan)?;
        if scanned.is_empty() {
            return Err(Error::input(format!(
                "No distributable files in {}",
                build_dir.display()
            )));
        }
        scanned.sort_by(|a, b| (!a.critical, &a.path).cmp(&(!b.critical, &b.path)));

        let files: Vec<_> = scanned
            .into_iter()
            .map(|f| {
                let url = self.options.file_url(&version, &f.path);
                f.into_entry(url)
            })
            .collect();

        let total_size = files.iter().map(|f| f.size).sum();
        let file_count = files.len();
        let critical = files.iter().filter(|f| f.critical).count();
        debug!("{} files ({} critical), {} bytes", file_count, critical, total_size);

        let breaking = self
            .options
            .breaking_override
            .unwrap_or_else(|| is_breaking(&parsed, self.options.breaking_rule));

        let changelog = changelog.filter(|c| !c.is_empty()).unwrap_or_else(|| {
            BTreeMap::from([(
                self.options.changelog_locale.clone(),
                format!("Update to version {}", version),
            )])
        });

        let signature = self.signer.sign(&version, &files)?;

        let manifest = Manifest {
            min_compatible_version: min_compatible_version(&parsed),
            release_date: Utc::now().trunc_subsecs(0),
            version,
            channel,
            breaking,
            changelog,
            files,
            total_size,
            file_count,
            signature,
        };

        info!(
            "Signed manifest {} with {} files ({} bytes)",
            manifest.version, manifest.file_count, manifest.total_size
        );
        Ok(manifest)
    }
}
