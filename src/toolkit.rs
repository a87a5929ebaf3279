// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External tool capability seams.
//!
//! The bootstrapper itself contains almost no provisioning logic. All of the
//! heavy lifting lives inside three delegated tools: a package manager, a
//! dotfile manager, and a container-isolation tool. Each one is wrapped in a
//! small capability trait so the dispatch flow can drive them without caring
//! which binary sits behind the seam, and so the test suite can substitute
//! fakes without ever spawning a real process.
//!
//! # Capability Traits
//!
//! Each trait exposes the handful of operations the dispatch flow actually
//! needs: a presence check, a self-install, and whatever apply or install
//! operations the tool contributes. Everything else a tool can do is out of
//! scope and stays opaque. A delegated operation either succeeds or fails as
//! a whole; nothing is caught or retried here.
//!
//! # Search Path Threading
//!
//! Installing a tool mid-run means later steps must be able to find it.
//! Rather than mutating the ambient `PATH` of the process, an explicit
//! [`SearchPath`] value is threaded through every operation. Self-install
//! operations push their install directory onto it, and presence checks plus
//! command invocations resolve binaries through it. Presence facts are
//! re-checked on demand, never cached.

pub mod chezmoi;
pub mod distrobox;
pub mod homebrew;

pub use chezmoi::Chezmoi;
pub use distrobox::Distrobox;
pub use homebrew::Homebrew;

use std::{
    env,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Command,
};
use tracing::debug;

/// Package manager capability seam.
///
/// Operations needed from a system package manager: presence check,
/// self-install through its own fetched bootstrap script, single package
/// installation, and batch installation from a manifest file.
pub trait PackageManager {
    /// Human-readable tool name.
    fn name(&self) -> &str;

    /// Check if the package manager is visible on the search path.
    fn is_installed(&self, search_path: &SearchPath) -> bool;

    /// Self-install the package manager via its own bootstrap script.
    ///
    /// Makes the freshly installed binary visible on the search path for the
    /// remainder of the run.
    ///
    /// # Errors
    ///
    /// - Return [`ToolkitError::Syscall`] if the bootstrap script fails.
    fn bootstrap(&self, search_path: &mut SearchPath) -> Result<()>;

    /// Install a single package by name.
    ///
    /// # Errors
    ///
    /// - Return [`ToolkitError::ToolNotFound`] if the package manager cannot
    ///   be located on the search path.
    /// - Return [`ToolkitError::Syscall`] if the install fails.
    fn install_package(&self, search_path: &SearchPath, package: &str) -> Result<()>;

    /// Batch install every package declared in a manifest file.
    ///
    /// # Errors
    ///
    /// - Return [`ToolkitError::ToolNotFound`] if the package manager cannot
    ///   be located on the search path.
    /// - Return [`ToolkitError::Syscall`] if the bundle install fails.
    fn bundle_install(&self, search_path: &SearchPath, manifest: &Path) -> Result<()>;
}

/// Dotfile manager capability seam.
///
/// Operations needed from a dotfile manager: presence check, standalone
/// self-install to a user-local path, one-shot initialize-from-remote, and
/// an idempotent apply against already-synced local state. The initialize
/// operation is a black box that clones the configuration remote, renders
/// templates, and runs whatever post-apply hooks the dotfiles declare.
pub trait DotfileManager {
    /// Human-readable tool name.
    fn name(&self) -> &str;

    /// Check if the dotfile manager is visible on the search path.
    fn is_installed(&self, search_path: &SearchPath) -> bool;

    /// Self-install the dotfile manager to a user-local directory.
    ///
    /// Makes the freshly installed binary visible on the search path for the
    /// remainder of the run.
    ///
    /// # Errors
    ///
    /// - Return [`ToolkitError::CreateBinDir`] if the user-local directory
    ///   cannot be created.
    /// - Return [`ToolkitError::Syscall`] if the install script fails.
    fn install_standalone(&self, search_path: &mut SearchPath, bin_dir: &Path) -> Result<()>;

    /// Initialize dotfile state from a remote and apply it in one shot.
    ///
    /// # Errors
    ///
    /// - Return [`ToolkitError::ToolNotFound`] if the dotfile manager cannot
    ///   be located on the search path.
    /// - Return [`ToolkitError::Syscall`] if the delegated operation fails.
    fn init_from_remote(&self, search_path: &SearchPath, url: &str) -> Result<()>;

    /// Apply already-initialized local dotfile state.
    ///
    /// # Errors
    ///
    /// - Return [`ToolkitError::ToolNotFound`] if the dotfile manager cannot
    ///   be located on the search path.
    /// - Return [`ToolkitError::Syscall`] if the delegated operation fails.
    fn apply(&self, search_path: &SearchPath) -> Result<()>;
}

/// Container-isolation tool capability seam.
///
/// Immutable hosts cannot install packages directly, so development tooling
/// lives inside a mutable container bridged into the host. The bootstrapper
/// only ensures the tool exists; building and filling the container is owned
/// by the dotfile manager's post-apply hooks.
pub trait ContainerTool {
    /// Human-readable tool name.
    fn name(&self) -> &str;

    /// Check if the container tool is visible on the search path.
    fn is_installed(&self, search_path: &SearchPath) -> bool;

    /// Self-install the container tool to a user-local directory.
    ///
    /// Makes the freshly installed binary visible on the search path for the
    /// remainder of the run.
    ///
    /// # Errors
    ///
    /// - Return [`ToolkitError::CreateBinDir`] if the user-local directory
    ///   cannot be created.
    /// - Return [`ToolkitError::Syscall`] if the install script fails.
    fn install_standalone(&self, search_path: &mut SearchPath, bin_dir: &Path) -> Result<()>;
}

/// Explicit binary search path.
///
/// Snapshot of the directories that binaries get resolved through. Taken
/// from the process environment once at startup, then threaded through every
/// tool operation as a plain value. Installing a tool mid-run prepends its
/// install directory here instead of mutating the ambient `PATH` of the
/// process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Construct search path from explicit directory listing.
    pub fn new(dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Construct search path from the `PATH` environment variable.
    ///
    /// An unset `PATH` yields an empty search path rather than an error,
    /// since every lookup will simply miss.
    pub fn from_env() -> Self {
        let dirs = env::var_os("PATH")
            .map(|raw| env::split_paths(&raw).collect())
            .unwrap_or_default();

        Self { dirs }
    }

    /// Make a directory take precedence for the remainder of the run.
    pub fn prepend(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.insert(0, dir.into());
    }

    /// Resolve a binary name to the first executable match.
    ///
    /// Walks directories in precedence order. Does not cache anything, so a
    /// binary installed after a failed lookup will be found by the next one.
    pub fn locate(&self, bin: impl AsRef<OsStr>) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(bin.as_ref()))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Run external command, blocking on it with full terminal access.
///
/// The child inherits stdin, stdout, and stderr, so any prompts or error
/// text the delegated tool prints surface directly to the user.
pub fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl Into<OsString>>,
) -> Result<()> {
    let args = args.into_iter().map(Into::into).collect::<Vec<_>>();
    debug!("syscall: {:?} {:?}", cmd.as_ref(), args);

    let status = Command::new(cmd.as_ref()).args(args).spawn()?.wait()?;
    if !status.success() {
        return Err(ToolkitError::Syscall(std::io::Error::other(format!(
            "command {:?} failed with {status}",
            cmd.as_ref()
        ))));
    }

    Ok(())
}

/// Run external command, capturing its output.
pub fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl Into<OsString>>,
) -> Result<String> {
    let args = args.into_iter().map(Into::into).collect::<Vec<_>>();
    debug!("syscall: {:?} {:?}", cmd.as_ref(), args);

    let output = Command::new(cmd.as_ref()).args(args).output()?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(stdout.as_str());
    }

    if !stderr.is_empty() {
        message.push_str(stderr.as_str());
    }

    // INVARIANT: Chomp trailing newlines.
    let message = message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message);

    if !output.status.success() {
        return Err(ToolkitError::Syscall(std::io::Error::other(format!(
            "command {:?} failed:\n{message}",
            cmd.as_ref()
        ))));
    }

    Ok(message)
}

/// External tool interaction error types.
#[derive(Debug, thiserror::Error)]
pub enum ToolkitError {
    /// Binary cannot be resolved through the search path.
    #[error("cannot locate {tool:?} on search path")]
    ToolNotFound { tool: String },

    /// User-local binary directory cannot be created.
    #[error("failed to create user-local binary directory at {:?}", bin_dir.display())]
    CreateBinDir {
        #[source]
        source: std::io::Error,
        bin_dir: PathBuf,
    },

    /// Shell profile file cannot be appended to.
    #[error("failed to append shell environment line to {:?}", path.display())]
    ShellProfileWrite {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// External command invocation fails.
    #[error(transparent)]
    Syscall(#[from] std::io::Error),
}

/// Friendly result alias :3
pub type Result<T, E = ToolkitError> = std::result::Result<T, E>;
