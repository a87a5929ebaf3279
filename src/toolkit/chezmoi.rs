// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Chezmoi dotfile manager driver.
//!
//! Everything interesting about dotfile state lives on chezmoi's side of the
//! seam: cloning the configuration remote, rendering templates per host, and
//! running post-apply hooks. This driver only knows how to get the binary
//! onto the host and kick off those delegated operations.

use crate::toolkit::{syscall_interactive, DotfileManager, Result, SearchPath, ToolkitError};

use std::{ffi::OsString, path::Path};
use tracing::{info, instrument};

/// Chezmoi driver.
#[derive(Debug, Default)]
pub struct Chezmoi;

impl Chezmoi {
    /// Construct new chezmoi driver.
    pub fn new() -> Self {
        Self
    }

    fn locate(&self, search_path: &SearchPath) -> Result<std::path::PathBuf> {
        search_path
            .locate("chezmoi")
            .ok_or_else(|| ToolkitError::ToolNotFound {
                tool: "chezmoi".into(),
            })
    }
}

impl DotfileManager for Chezmoi {
    fn name(&self) -> &str {
        "chezmoi"
    }

    fn is_installed(&self, search_path: &SearchPath) -> bool {
        search_path.locate("chezmoi").is_some()
    }

    #[instrument(skip(self, search_path, bin_dir), level = "debug")]
    fn install_standalone(&self, search_path: &mut SearchPath, bin_dir: &Path) -> Result<()> {
        mkdirp::mkdirp(bin_dir).map_err(|err| ToolkitError::CreateBinDir {
            source: err,
            bin_dir: bin_dir.to_path_buf(),
        })?;

        info!("fetch and run chezmoi install script");
        let script = format!(
            "curl -fsLS get.chezmoi.io | sh -s -- -b {}",
            bin_dir.display()
        );
        syscall_interactive("sh", ["-c", script.as_str()])?;
        search_path.prepend(bin_dir);

        Ok(())
    }

    #[instrument(skip(self, search_path), level = "debug")]
    fn init_from_remote(&self, search_path: &SearchPath, url: &str) -> Result<()> {
        info!("initialize dotfile state from {url}");
        let chezmoi = self.locate(search_path)?;
        let args: Vec<OsString> = vec!["init".into(), "--apply".into(), url.into()];
        syscall_interactive(chezmoi, args)
    }

    #[instrument(skip(self, search_path), level = "debug")]
    fn apply(&self, search_path: &SearchPath) -> Result<()> {
        info!("apply local dotfile state");
        let chezmoi = self.locate(search_path)?;
        syscall_interactive(chezmoi, ["apply"])
    }
}
