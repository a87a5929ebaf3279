// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! interacted with, or managed in some way.

use std::path::PathBuf;

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to bootstrap profile file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/dotstrap/config.toml` as
/// the default absolute path for a bootstrap profile. Does not check if the
/// path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_profile_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("dotstrap").join("config.toml"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to package manifest file.
///
/// Homebrew's global bundle operation expects its manifest at
/// `$HOME/.Brewfile`. Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_manifest_path() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".Brewfile"))
}

/// Determine default absolute path to persistent shell profile file.
///
/// The package manager's shell environment line gets appended here on Linux
/// hosts. Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_shell_profile_path() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".profile"))
}

/// Determine default absolute path to user-local binary directory.
///
/// Standalone tool installs land in `$HOME/.local/bin`. Does not check if the
/// path returned actually exists, nor does it create it.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_bin_dir() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".local").join("bin"))
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
