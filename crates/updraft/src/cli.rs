//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use updraft_core::Channel;

/// updraft - signed update manifests for web application builds
#[derive(Parser, Debug)]
#[command(name = "updraft")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a project config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Hash, sign and publish a manifest for a build directory
    Generate(GenerateArgs),

    /// Verify a manifest signature, and optionally the files it lists
    Verify(VerifyArgs),

    /// Upload a manifest's artifacts to an object store
    Deploy(DeployArgs),

    /// Run the distribution API
    Serve(ServeArgs),

    /// Signing key management
    #[command(subcommand)]
    Keys(KeysCommands),

    /// Check a server for updates and optionally install them
    Check(CheckArgs),
}

fn parse_channel(s: &str) -> Result<Channel, String> {
    s.parse().map_err(|e: updraft_core::Error| e.to_string())
}

// Generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Release version (major.minor.patch)
    #[arg(long = "version", value_name = "VERSION")]
    pub release: String,

    /// Release channel
    #[arg(long, value_parser = parse_channel, default_value = "stable")]
    pub channel: Channel,

    /// Build output directory (default: builder.build-dir)
    #[arg(short, long)]
    pub build_dir: Option<Utf8PathBuf>,

    /// Write the manifest to a file instead of publishing it
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,

    /// Changelog entry as LOCALE=TEXT (repeatable)
    #[arg(long, value_name = "LOCALE=TEXT")]
    pub changelog: Vec<String>,

    /// Mark the release as breaking
    #[arg(long, conflicts_with = "not_breaking")]
    pub breaking: bool,

    /// Mark the release as non-breaking
    #[arg(long)]
    pub not_breaking: bool,

    /// Override cdn.base-url for file URLs
    #[arg(long)]
    pub base_url: Option<String>,

    /// Republish a version that already exists on the channel
    #[arg(short, long)]
    pub force: bool,
}

impl GenerateArgs {
    pub fn breaking_override(&self) -> Option<bool> {
        if self.breaking {
            Some(true)
        } else if self.not_breaking {
            Some(false)
        } else {
            None
        }
    }
}

// Verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Manifest JSON file
    pub manifest: Utf8PathBuf,

    /// Pinned public key (default: signing.public-key, then the keys dir)
    #[arg(long)]
    pub public_key: Option<Utf8PathBuf>,

    /// Also hash every listed file in this build directory
    #[arg(short, long)]
    pub build_dir: Option<Utf8PathBuf>,
}

// Deploy command
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Manifest JSON file
    #[arg(short, long)]
    pub manifest: Utf8PathBuf,

    /// Build output directory (default: builder.build-dir)
    #[arg(short, long)]
    pub build_dir: Option<Utf8PathBuf>,

    /// Object store target: local, s3 (default: store.default-target)
    #[arg(short, long)]
    pub target: Option<String>,
}

// Serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind address (default: server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (default: server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

// Keys commands
#[derive(Subcommand, Debug)]
pub enum KeysCommands {
    /// Generate the signing key pair
    Init(KeysInitArgs),

    /// Print the public key
    Show,
}

#[derive(Args, Debug)]
pub struct KeysInitArgs {
    /// RSA modulus size (default: signing.key-bits)
    #[arg(long)]
    pub bits: Option<usize>,
}

// Check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// API root (default: http://localhost:{server.port}/v1/updates)
    #[arg(short, long)]
    pub server: Option<String>,

    /// Release channel
    #[arg(long, value_parser = parse_channel, default_value = "stable")]
    pub channel: Channel,

    /// Running version (default: version installed in --install-dir, else 0.0.0)
    #[arg(long)]
    pub current_version: Option<String>,

    /// Pinned public key (default: signing.public-key, then the keys dir)
    #[arg(long)]
    pub public_key: Option<Utf8PathBuf>,

    /// Download, verify and apply the update into this directory
    #[arg(short, long)]
    pub install_dir: Option<Utf8PathBuf>,
}
