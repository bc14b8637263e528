//! Signing key commands

use crate::cli::{KeysCommands, KeysInitArgs};
use crate::commands::load_config;
use crate::output;
use anyhow::{Context, Result};
use camino::Utf8Path;
use updraft_core::UpdraftConfig;
use updraft_manifest::KeyStore;

pub fn run(cmd: KeysCommands, config_file: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_file)?;
    match cmd {
        KeysCommands::Init(args) => init(args, &config),
        KeysCommands::Show => show(&config),
    }
}

fn init(args: KeysInitArgs, config: &UpdraftConfig) -> Result<()> {
    let keys = KeyStore::new(config.signing.keys_dir.clone());
    let bits = args.bits.unwrap_or(config.signing.key_bits);

    output::header("Generate signing key pair");
    output::kv("Directory", keys.dir().as_str());
    output::kv("Bits", &bits.to_string());

    let spinner = output::spinner("Generating RSA key pair...");
    let result = keys.generate(bits);
    spinner.finish_and_clear();
    result.context("Failed to generate key pair")?;

    output::success(&format!("Private key saved to {}", keys.private_key_path()));
    output::success(&format!("Public key saved to {}", keys.public_key_path()));
    output::warning("Keep the private key secret and backed up; clients pin the public key");
    Ok(())
}

fn show(config: &UpdraftConfig) -> Result<()> {
    let keys = KeyStore::new(config.signing.keys_dir.clone());
    let pem = keys
        .public_key_pem()
        .with_context(|| format!("No public key in {}; run `updraft keys init`", keys.dir()))?;
    print!("{}", pem);
    Ok(())
}
