// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Homebrew package manager driver.
//!
//! Homebrew covers both recognized platforms: macOS natively, and standard
//! Linux through Linuxbrew. Self-installation goes through Homebrew's own
//! fetched bootstrap script. On Linux the brew prefix does not land on the
//! default `PATH`, so one shell environment line gets appended to the user's
//! persistent shell profile file for future logins, while the current run
//! finds the binary through the threaded search path.

use crate::{
    platform::Platform,
    toolkit::{syscall_interactive, PackageManager, Result, SearchPath, ToolkitError},
};

use std::{
    ffi::OsString,
    fs::{read_to_string, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// One-liner that fetches and runs Homebrew's own install script.
pub const HOMEBREW_BOOTSTRAP: &str =
    "curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh | /bin/bash";

/// Shell environment line Linuxbrew needs in a persistent shell profile.
pub const LINUXBREW_SHELLENV: &str = r#"eval "$(/home/linuxbrew/.linuxbrew/bin/brew shellenv)""#;

/// Homebrew driver.
#[derive(Debug)]
pub struct Homebrew {
    platform: Platform,
    shell_profile: PathBuf,
}

impl Homebrew {
    /// Construct new Homebrew driver.
    pub fn new(platform: Platform, shell_profile: impl Into<PathBuf>) -> Self {
        Self {
            platform,
            shell_profile: shell_profile.into(),
        }
    }

    /// Candidate brew prefix binary directories for the platform.
    fn prefix_bin_dirs(&self) -> &'static [&'static str] {
        match self.platform {
            // Apple Silicon and Intel prefixes respectively.
            Platform::MacOs => &["/opt/homebrew/bin", "/usr/local/bin"],
            Platform::Linux => &["/home/linuxbrew/.linuxbrew/bin"],
        }
    }

    /// Append shell environment line to persistent shell profile.
    ///
    /// Skipped when the line is already present, so repeated bootstraps do
    /// not pile up duplicates.
    ///
    /// # Errors
    ///
    /// - Return [`ToolkitError::ShellProfileWrite`] if the shell profile
    ///   file cannot be appended to.
    fn append_shell_environment(&self) -> Result<()> {
        let current = read_to_string(&self.shell_profile).unwrap_or_default();
        if current.contains(LINUXBREW_SHELLENV) {
            debug!("shell environment line already in {:?}", self.shell_profile.display());
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.shell_profile)
            .map_err(|err| ToolkitError::ShellProfileWrite {
                source: err,
                path: self.shell_profile.clone(),
            })?;
        writeln!(file, "{LINUXBREW_SHELLENV}").map_err(|err| ToolkitError::ShellProfileWrite {
            source: err,
            path: self.shell_profile.clone(),
        })?;

        info!(
            "appended shell environment line to {:?}",
            self.shell_profile.display()
        );

        Ok(())
    }
}

impl PackageManager for Homebrew {
    fn name(&self) -> &str {
        "homebrew"
    }

    fn is_installed(&self, search_path: &SearchPath) -> bool {
        search_path.locate("brew").is_some()
    }

    /// Self-install Homebrew via its own bootstrap script.
    ///
    /// On Linux the shell environment line gets appended to the persistent
    /// shell profile afterwards. Whichever prefix binary directories exist
    /// are pushed onto the search path so the rest of the run can find brew.
    #[instrument(skip(self, search_path), level = "debug")]
    fn bootstrap(&self, search_path: &mut SearchPath) -> Result<()> {
        info!("fetch and run homebrew bootstrap script");
        syscall_interactive("/bin/bash", ["-c", HOMEBREW_BOOTSTRAP])?;

        if matches!(self.platform, Platform::Linux) {
            self.append_shell_environment()?;
        }

        for dir in self.prefix_bin_dirs() {
            if Path::new(dir).is_dir() {
                search_path.prepend(*dir);
            }
        }

        Ok(())
    }

    fn install_package(&self, search_path: &SearchPath, package: &str) -> Result<()> {
        let brew = search_path
            .locate("brew")
            .ok_or_else(|| ToolkitError::ToolNotFound {
                tool: "brew".into(),
            })?;
        syscall_interactive(brew, ["install", package])
    }

    fn bundle_install(&self, search_path: &SearchPath, manifest: &Path) -> Result<()> {
        let brew = search_path
            .locate("brew")
            .ok_or_else(|| ToolkitError::ToolNotFound {
                tool: "brew".into(),
            })?;

        let args: Vec<OsString> = vec![
            "bundle".into(),
            "install".into(),
            "--file".into(),
            manifest.as_os_str().into(),
        ];
        syscall_interactive(brew, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test]
    fn shell_environment_line_appended_once() -> anyhow::Result<()> {
        let homebrew = Homebrew::new(Platform::Linux, "profile");
        std::fs::write("profile", "# login shell setup\n")?;

        homebrew.append_shell_environment()?;
        homebrew.append_shell_environment()?;

        let content = read_to_string("profile")?;
        let hits = content
            .lines()
            .filter(|line| *line == LINUXBREW_SHELLENV)
            .count();
        assert_eq!(hits, 1);
        assert!(content.starts_with("# login shell setup\n"));

        Ok(())
    }

    #[sealed_test]
    fn shell_environment_creates_missing_profile() -> anyhow::Result<()> {
        let homebrew = Homebrew::new(Platform::Linux, "profile");
        homebrew.append_shell_environment()?;

        let content = read_to_string("profile")?;
        assert_eq!(content, format!("{LINUXBREW_SHELLENV}\n"));

        Ok(())
    }
}
