//! regpin - Update nix registry entries from a flake.lock file
//!
//! Usage:
//!   regpin                        # pin 'nixpkgs' from ./flake.lock
//!   regpin --entry-name foo       # pin a different entry
//!   regpin --no-prefetch          # registry update only

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use regpin_core::commands::{DEFAULT_ENTRY, DEFAULT_LOCK_FILE, PinCommand, PinOptions, PinReport};

const LONG_ABOUT: &str = "\
Update nix registry entries from a flake.lock file.

Basic usage is just run with no arguments, which:

 - reads the 'flake.lock' file in the current directory
 - extracts the 'nixpkgs' version specified there
 - writes it to the user nix registry (under ~/.config/nix)
 - ensures this nixpkgs is in the nix store
 - provides a NIX_PATH declaration in ~/.nix-path

so subsequent invocations of eg 'nix shell nixpkgs#<package>'
use the nixpkgs version that is pinned in the flake.lock file.

The NIX_PATH declaration is just to mop up any remaining things
like nix-shell usage involving <nixpkgs>. It's up to the user to
actually source ~/.nix-path to opt into this.";

#[derive(Parser)]
#[command(name = "regpin", version)]
#[command(about = "Update nix registry entries from a flake.lock file")]
#[command(long_about = LONG_ABOUT)]
struct Cli {
    /// Lock file to read the pinned version from
    #[arg(long, default_value = DEFAULT_LOCK_FILE)]
    lock_file: PathBuf,

    /// Entry name to copy from the lock file into the registry
    #[arg(long, default_value = DEFAULT_ENTRY)]
    entry_name: String,

    /// Registry file to update (default: the user registry)
    #[arg(long)]
    registry_file: Option<PathBuf>,

    /// Skip prefetching the source and updating the NIX_PATH hint file
    #[arg(long)]
    no_prefetch: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regpin=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let registry_file = match cli.registry_file {
        Some(path) => path,
        None => default_registry_file()?,
    };
    tracing::debug!(registry_file = %registry_file.display(), "resolved registry file");

    let options = PinOptions::new(registry_file)
        .with_lock_file(cli.lock_file)
        .with_entry_name(cli.entry_name)
        .with_prefetch(!cli.no_prefetch);

    let cmd = PinCommand::with_defaults()?;
    let report = cmd.execute(&options)?;

    print_report(&report);
    Ok(())
}

/// The per-user registry consulted by nix, `~/.config/nix/registry.json`.
fn default_registry_file() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(config_dir.join("nix").join("registry.json"))
}

fn print_report(report: &PinReport) {
    let target = report
        .to
        .rev
        .as_deref()
        .unwrap_or(&report.to.ref_type);
    println!(
        "✓ Pinned '{}' -> {} in {}",
        report.entry_name,
        target,
        report.registry_file.display()
    );

    if let Some(ref store_path) = report.store_path {
        println!("  Store path: {}", store_path.display());
    }
    if let Some(ref hint_file) = report.hint_file {
        println!("  NIX_PATH hint: {}", hint_file.display());
    }
    for warning in &report.warnings {
        eprintln!("  ⚠ {warning}");
    }
}
