// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Distrobox container-isolation tool driver.

use crate::toolkit::{syscall_interactive, ContainerTool, Result, SearchPath, ToolkitError};

use std::path::Path;
use tracing::{info, instrument};

/// Distrobox driver.
#[derive(Debug, Default)]
pub struct Distrobox;

impl Distrobox {
    /// Construct new distrobox driver.
    pub fn new() -> Self {
        Self
    }
}

impl ContainerTool for Distrobox {
    fn name(&self) -> &str {
        "distrobox"
    }

    fn is_installed(&self, search_path: &SearchPath) -> bool {
        search_path.locate("distrobox").is_some()
    }

    /// Self-install distrobox under a user-local prefix.
    ///
    /// Distrobox's install script takes a prefix and drops its binaries in
    /// `<prefix>/bin`, so the prefix is the parent of the target binary
    /// directory.
    #[instrument(skip(self, search_path, bin_dir), level = "debug")]
    fn install_standalone(&self, search_path: &mut SearchPath, bin_dir: &Path) -> Result<()> {
        mkdirp::mkdirp(bin_dir).map_err(|err| ToolkitError::CreateBinDir {
            source: err,
            bin_dir: bin_dir.to_path_buf(),
        })?;

        let prefix = bin_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| bin_dir.to_path_buf());

        info!("fetch and run distrobox install script");
        let script = format!(
            "curl -s https://raw.githubusercontent.com/89luca89/distrobox/main/install | sh -s -- --prefix {}",
            prefix.display()
        );
        syscall_interactive("sh", ["-c", script.as_str()])?;
        search_path.prepend(bin_dir);

        Ok(())
    }
}
