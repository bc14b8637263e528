//! Check command: the reference client against a running server

use crate::cli::CheckArgs;
use crate::commands::{load_config, load_trusted_key};
use crate::output;
use anyhow::{Context, Result};
use camino::Utf8Path;
use updraft_client::{installed_version, UpdateCheck, UpdateClient};
use updraft_server::{API_PREFIX, DEFAULT_CLIENT_VERSION};

pub async fn run(args: CheckArgs, config_file: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_file)?;
    let key = load_trusted_key(args.public_key.clone(), &config)?;
    let server = args
        .server
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}{}", config.server.port, API_PREFIX));

    let current = args
        .current_version
        .clone()
        .or_else(|| {
            args.install_dir
                .as_ref()
                .and_then(|dir| installed_version(dir.as_std_path()))
        })
        .unwrap_or_else(|| DEFAULT_CLIENT_VERSION.to_string());

    output::header(&format!("Check {} for updates", args.channel));
    output::kv("Server", &server);
    output::kv("Current version", &current);

    let client = UpdateClient::new(server.as_str(), key)?;
    let spinner = output::spinner("Fetching manifest...");
    let result = client.check(args.channel, &current).await;
    spinner.finish_and_clear();

    let update = match result.context("Update check failed")? {
        UpdateCheck::NoManifest => {
            output::info(&format!("Nothing published on {}", args.channel));
            return Ok(());
        }
        UpdateCheck::UpToDate { latest } => {
            output::success(&format!("Up to date (latest is {})", latest));
            return Ok(());
        }
        UpdateCheck::Available(update) => update,
    };

    let manifest = &update.manifest;
    output::success(&format!("Update available: {} (signature verified)", manifest.version));
    output::kv("Files", &manifest.file_count.to_string());
    output::kv("Size", &output::format_size(manifest.total_size));
    output::kv("Breaking", &manifest.breaking.to_string());
    for (locale, text) in &manifest.changelog {
        output::kv(&format!("Changelog [{}]", locale), text);
    }

    if update.requires_full_install {
        output::warning(&format!(
            "{} requires at least {}; a full reinstall is needed",
            manifest.version, manifest.min_compatible_version
        ));
        return Ok(());
    }

    let Some(install_dir) = &args.install_dir else {
        return Ok(());
    };

    let spinner = output::spinner("Downloading and verifying files...");
    let result = client.download(manifest, install_dir.as_std_path()).await;
    spinner.finish_and_clear();
    let staged = result.context("Download failed; nothing was installed")?;

    let applied = staged.apply().context("Failed to apply update")?;
    output::success(&format!(
        "Installed {} ({} files) into {}",
        manifest.version,
        applied.len(),
        install_dir
    ));
    Ok(())
}
