// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for configuration files that Dotstrap uses to simplify
//! the process of serialization and deserialization. File I/O is left to the
//! caller to figure out.

use crate::path::{
    default_bin_dir, default_manifest_path, default_shell_profile_path, NoWayHome,
};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Bootstrap profile layout.
///
/// A __bootstrap profile__ is a simple configuration file that details where
/// the bootstrapper should pull dotfiles from, and which well-known paths it
/// should use while provisioning the host.
///
/// # General Layout
///
/// A bootstrap profile holds a single settings section. The settings section
/// names the remote that the dotfile manager initializes from, the package
/// manifest to bundle install from, the shell profile file to append
/// environment setup to, and the user-local directory that standalone tool
/// installs land in.
///
/// Every field is optional in file form. Missing fields fall back to the
/// fixed well-known paths under the user's home directory.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct BootstrapProfile {
    /// Settings for the bootstrapper.
    pub settings: ProfileSettings,
}

impl BootstrapProfile {
    /// Construct profile filled with fixed well-known paths.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoWayHome`] if home directory path cannot be
    ///   determined.
    pub fn try_default() -> Result<Self> {
        Ok(Self {
            settings: ProfileSettings {
                dotfiles_url: "https://github.com/awkless/dotfiles.git".into(),
                manifest: default_manifest_path()?,
                shell_profile: default_shell_profile_path()?,
                bin_dir: default_bin_dir()?,
            },
        })
    }
}

impl FromStr for BootstrapProfile {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let sparse: SparseProfile = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;
        let fallback = BootstrapProfile::try_default()?;

        // INVARIANT: Perform shell expansion on all path fields.
        let settings = ProfileSettings {
            dotfiles_url: sparse
                .settings
                .dotfiles_url
                .unwrap_or(fallback.settings.dotfiles_url),
            manifest: expand_or(sparse.settings.manifest, fallback.settings.manifest)?,
            shell_profile: expand_or(
                sparse.settings.shell_profile,
                fallback.settings.shell_profile,
            )?,
            bin_dir: expand_or(sparse.settings.bin_dir, fallback.settings.bin_dir)?,
        };

        Ok(Self { settings })
    }
}

impl Display for BootstrapProfile {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Bootstrap configuration settings.
///
/// Standard settings to use for any given bootstrap run.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProfileSettings {
    /// Remote URL that the dotfile manager initializes from.
    pub dotfiles_url: String,

    /// Path to package manifest for bundle installation.
    pub manifest: PathBuf,

    /// Path to persistent shell profile file.
    pub shell_profile: PathBuf,

    /// Path to user-local binary directory for standalone installs.
    pub bin_dir: PathBuf,
}

/// File form of the settings section, before fallback resolution.
#[derive(Default, Debug, Deserialize)]
struct SparseProfile {
    #[serde(default)]
    settings: SparseSettings,
}

#[derive(Default, Debug, Deserialize)]
struct SparseSettings {
    dotfiles_url: Option<String>,
    manifest: Option<String>,
    shell_profile: Option<String>,
    bin_dir: Option<String>,
}

fn expand_or(field: Option<String>, fallback: PathBuf) -> Result<PathBuf> {
    match field {
        Some(raw) => Ok(PathBuf::from(
            shellexpand::full(raw.as_str())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned(),
        )),
        None => Ok(fallback),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Failed to determine home directory for fallback paths.
    #[error(transparent)]
    NoWayHome(#[from] NoWayHome),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
