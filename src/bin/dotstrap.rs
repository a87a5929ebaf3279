// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dotstrap::{
    bootstrap::{AssumeYes, Bootstrapper, InquireGate},
    config::BootstrapProfile,
    path::default_profile_path,
    platform::{detect, DetectError, UnameProbe},
    toolkit::{Chezmoi, Distrobox, Homebrew, SearchPath},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{fs::read_to_string, path::PathBuf, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  dotstrap [options] <dotstrap-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        match self.command {
            Command::Up(opts) => run_up(opts).await,
            Command::Status => run_status(),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Provision the host from top to bottom.
    #[command(override_usage = "dotstrap up [options]")]
    Up(UpOptions),

    /// Show detected platform and tool presence facts.
    #[command(override_usage = "dotstrap status")]
    Status,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct UpOptions {
    /// Remote URL that the dotfile manager initializes from.
    #[arg(short, long, value_name = "url")]
    pub url: Option<String>,

    /// Path to package manifest for bundle installation.
    #[arg(short, long, value_name = "path")]
    pub manifest: Option<PathBuf>,

    /// Path to bootstrap profile file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Install missing tools without asking first.
    #[arg(short = 'y', long)]
    pub assume_yes: bool,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");

        // Unsupported platforms get their own exit status so wrapper scripts
        // can tell "wrong host" apart from "run failed".
        if matches!(
            error.downcast_ref::<DetectError>(),
            Some(DetectError::UnsupportedKernel(_))
        ) {
            exit(2);
        }

        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

async fn run_up(opts: UpOptions) -> Result<()> {
    let mut profile = load_profile(opts.config)?;
    if let Some(url) = opts.url {
        profile.settings.dotfiles_url = url;
    }
    if let Some(manifest) = opts.manifest {
        profile.settings.manifest = manifest;
    }

    let facts = detect(&UnameProbe::new())?;
    let search_path = SearchPath::from_env();
    let homebrew = Homebrew::new(facts.platform, profile.settings.shell_profile.clone());

    if opts.assume_yes {
        let bootstrapper = Bootstrapper::new(
            facts,
            profile,
            search_path,
            homebrew,
            Chezmoi::new(),
            Distrobox::new(),
            AssumeYes,
        );
        tokio::task::spawn_blocking(move || bootstrapper.run()).await??;
    } else {
        let bootstrapper = Bootstrapper::new(
            facts,
            profile,
            search_path,
            homebrew,
            Chezmoi::new(),
            Distrobox::new(),
            InquireGate::new(),
        );
        tokio::task::spawn_blocking(move || bootstrapper.run()).await??;
    }

    Ok(())
}

fn run_status() -> Result<()> {
    let facts = detect(&UnameProbe::new())?;
    let search_path = SearchPath::from_env();

    println!("platform: {facts}");
    for (tool, bin) in [
        ("homebrew", "brew"),
        ("chezmoi", "chezmoi"),
        ("distrobox", "distrobox"),
    ] {
        match search_path.locate(bin) {
            Some(path) => println!("{tool}: {}", path.display()),
            None => println!("{tool}: not installed"),
        }
    }

    Ok(())
}

fn load_profile(config: Option<PathBuf>) -> Result<BootstrapProfile> {
    let path = match config {
        Some(path) => path,
        None => default_profile_path()?,
    };

    let profile = if path.exists() {
        read_to_string(&path)?.parse()?
    } else {
        BootstrapProfile::try_default()?
    };

    Ok(profile)
}
