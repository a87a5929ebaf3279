// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap decision-and-dispatch flow.
//!
//! Given detected host facts, drive the delegated tools in the right order
//! to land a fully configured development environment. There are exactly two
//! dispatch branches, and a host always takes one of them, never both.
//!
//! # Standard Branch
//!
//! macOS and ordinary Linux hosts can install packages directly, so the flow
//! is: ensure the package manager exists (self-installing it if absent),
//! ensure the dotfile manager exists (installing it through the package
//! manager), bundle install the package manifest when one is present at its
//! fixed path, then apply already-initialized dotfile state. A missing
//! manifest is the one non-fatal condition in the whole flow: a warning gets
//! emitted, and the run continues straight to the apply step.
//!
//! # Immutable Branch
//!
//! Immutable Linux hosts keep their base file system read-only, so no
//! package manager gets installed on the host at all. Instead the flow
//! ensures the container-isolation tool and the dotfile manager exist as
//! user-local standalone installs, then hands the rest of provisioning to
//! the dotfile manager's initialize-from-remote operation. Whatever happens
//! inside of it, like building the container and filling it with tooling via
//! post-apply hooks, is opaque to the bootstrapper.
//!
//! # Failure Semantics
//!
//! Fail-fast all the way down. Every delegated operation either succeeds or
//! aborts the run with its own failure, propagated through plain `Result`
//! returns. Nothing is caught, retried, or rolled back. Each delegated tool
//! is idempotent on its own ("install if absent", "apply" is declarative),
//! so the recovery story is to re-run the bootstrapper after fixing the
//! underlying cause.

use crate::{
    config::BootstrapProfile,
    platform::HostFacts,
    toolkit::{ContainerTool, DotfileManager, PackageManager, SearchPath, ToolkitError},
};

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Layer of indirection for install confirmation.
///
/// Fetching and running an install script is the one action the bootstrapper
/// takes that downloads and executes foreign code, so the user gets asked
/// first. Batch runs substitute [`AssumeYes`]; tests substitute fakes.
pub trait InstallGate {
    /// Ask whether a missing tool should be fetched and installed.
    ///
    /// # Errors
    ///
    /// - Return [`BootstrapError::Prompt`] if the question cannot be asked.
    fn confirm(&self, tool: &str) -> Result<bool>;
}

/// Install gate that prompts the user on the terminal.
#[derive(Debug, Default)]
pub struct InquireGate;

impl InquireGate {
    /// Construct new interactive install gate.
    pub fn new() -> Self {
        Self
    }
}

impl InstallGate for InquireGate {
    fn confirm(&self, tool: &str) -> Result<bool> {
        let answer = inquire::Confirm::new(format!("{tool} is missing. Fetch and install it?").as_str())
            .with_default(true)
            .prompt()?;
        Ok(answer)
    }
}

/// Install gate that never asks.
#[derive(Debug, Default)]
pub struct AssumeYes;

impl InstallGate for AssumeYes {
    fn confirm(&self, _tool: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Environment bootstrapper.
///
/// Owns the detected host facts, the threaded search path, and the three
/// capability seams, then runs the dispatch branch the facts select. Facts
/// are derived once before construction and never change mid-run.
#[derive(Debug)]
pub struct Bootstrapper<P, D, C, G>
where
    P: PackageManager,
    D: DotfileManager,
    C: ContainerTool,
    G: InstallGate,
{
    facts: HostFacts,
    profile: BootstrapProfile,
    search_path: SearchPath,
    package_manager: P,
    dotfile_manager: D,
    container_tool: C,
    gate: G,
}

impl<P, D, C, G> Bootstrapper<P, D, C, G>
where
    P: PackageManager,
    D: DotfileManager,
    C: ContainerTool,
    G: InstallGate,
{
    /// Construct new bootstrapper.
    pub fn new(
        facts: HostFacts,
        profile: BootstrapProfile,
        search_path: SearchPath,
        package_manager: P,
        dotfile_manager: D,
        container_tool: C,
        gate: G,
    ) -> Self {
        Self {
            facts,
            profile,
            search_path,
            package_manager,
            dotfile_manager,
            container_tool,
            gate,
        }
    }

    /// Run the full bootstrap flow for the detected host.
    ///
    /// Dispatches into the immutable or standard branch, reporting each step
    /// as it goes, with a trailing success banner on completion.
    ///
    /// # Errors
    ///
    /// - Return first failure of any delegated operation; later steps do not
    ///   execute.
    #[instrument(skip(self), level = "debug")]
    pub fn run(mut self) -> Result<()> {
        info!("bootstrapping {} host", self.facts);
        let bar = step_bar()?;

        if self.facts.is_immutable_linux() {
            self.run_immutable(&bar)?;
        } else {
            self.run_standard(&bar)?;
        }

        bar.finish_and_clear();
        info!("environment ready to go");

        Ok(())
    }

    /// Immutable branch: containerized provisioning.
    fn run_immutable(&mut self, bar: &ProgressBar) -> Result<()> {
        bar.set_message(format!("ensure {}", self.container_tool.name()));
        self.ensure_container_tool()?;

        bar.set_message(format!("ensure {}", self.dotfile_manager.name()));
        self.ensure_dotfile_manager_standalone()?;

        bar.set_message(format!(
            "{} init from {}",
            self.dotfile_manager.name(),
            self.profile.settings.dotfiles_url
        ));
        self.dotfile_manager
            .init_from_remote(&self.search_path, self.profile.settings.dotfiles_url.as_str())?;

        Ok(())
    }

    /// Standard branch: direct host provisioning.
    fn run_standard(&mut self, bar: &ProgressBar) -> Result<()> {
        bar.set_message(format!("ensure {}", self.package_manager.name()));
        self.ensure_package_manager()?;

        bar.set_message(format!("ensure {}", self.dotfile_manager.name()));
        self.ensure_dotfile_manager_packaged()?;

        let manifest = self.profile.settings.manifest.clone();
        if manifest.exists() {
            bar.set_message(format!("bundle install from {:?}", manifest.display()));
            self.package_manager
                .bundle_install(&self.search_path, manifest.as_path())?;
        } else {
            warn!(
                "no package manifest at {:?}, skipping bundle install",
                manifest.display()
            );
        }

        bar.set_message(format!("{} apply", self.dotfile_manager.name()));
        self.dotfile_manager.apply(&self.search_path)?;

        Ok(())
    }

    fn ensure_package_manager(&mut self) -> Result<()> {
        if self.package_manager.is_installed(&self.search_path) {
            info!("{} already installed", self.package_manager.name());
            return Ok(());
        }

        self.request_install(self.package_manager.name().to_owned())?;
        self.package_manager.bootstrap(&mut self.search_path)?;

        Ok(())
    }

    fn ensure_dotfile_manager_packaged(&mut self) -> Result<()> {
        if self.dotfile_manager.is_installed(&self.search_path) {
            info!("{} already installed", self.dotfile_manager.name());
            return Ok(());
        }

        self.request_install(self.dotfile_manager.name().to_owned())?;
        self.package_manager
            .install_package(&self.search_path, self.dotfile_manager.name())?;

        Ok(())
    }

    fn ensure_dotfile_manager_standalone(&mut self) -> Result<()> {
        if self.dotfile_manager.is_installed(&self.search_path) {
            info!("{} already installed", self.dotfile_manager.name());
            return Ok(());
        }

        self.request_install(self.dotfile_manager.name().to_owned())?;
        let bin_dir = self.profile.settings.bin_dir.clone();
        self.dotfile_manager
            .install_standalone(&mut self.search_path, bin_dir.as_path())?;

        Ok(())
    }

    fn ensure_container_tool(&mut self) -> Result<()> {
        if self.container_tool.is_installed(&self.search_path) {
            info!("{} already installed", self.container_tool.name());
            return Ok(());
        }

        self.request_install(self.container_tool.name().to_owned())?;
        let bin_dir = self.profile.settings.bin_dir.clone();
        self.container_tool
            .install_standalone(&mut self.search_path, bin_dir.as_path())?;

        Ok(())
    }

    fn request_install(&self, tool: String) -> Result<()> {
        if !self.gate.confirm(tool.as_str())? {
            return Err(BootstrapError::InstallDeclined { tool });
        }

        Ok(())
    }
}

fn step_bar() -> Result<ProgressBar> {
    let style = ProgressStyle::with_template("{spinner:.green}  {msg}")?;
    let bar = ProgressBar::new_spinner().with_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));

    Ok(bar)
}

/// Bootstrap flow error types.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// User declined a fetch-and-install step.
    #[error("installation of {tool:?} declined")]
    InstallDeclined { tool: String },

    /// Delegated tool operation fails.
    #[error(transparent)]
    Toolkit(#[from] ToolkitError),

    /// Install confirmation cannot be prompted.
    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),
}

/// Friendly result alias :3
pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ProfileSettings,
        platform::{HostFacts, Platform},
    };
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::{
        cell::{Cell, RefCell},
        path::{Path, PathBuf},
        rc::Rc,
    };

    type Journal = Rc<RefCell<Vec<String>>>;

    struct FakePackageManager {
        journal: Journal,
        installed: Cell<bool>,
        fail_bootstrap: bool,
    }

    impl FakePackageManager {
        fn new(journal: Journal, installed: bool) -> Self {
            Self {
                journal,
                installed: Cell::new(installed),
                fail_bootstrap: false,
            }
        }

        fn failing(journal: Journal) -> Self {
            Self {
                journal,
                installed: Cell::new(false),
                fail_bootstrap: true,
            }
        }
    }

    impl PackageManager for FakePackageManager {
        fn name(&self) -> &str {
            "homebrew"
        }

        fn is_installed(&self, _search_path: &SearchPath) -> bool {
            self.installed.get()
        }

        fn bootstrap(&self, _search_path: &mut SearchPath) -> crate::toolkit::Result<()> {
            if self.fail_bootstrap {
                return Err(ToolkitError::Syscall(std::io::Error::other(
                    "bootstrap script failed",
                )));
            }

            self.journal.borrow_mut().push("bootstrap homebrew".into());
            self.installed.set(true);
            Ok(())
        }

        fn install_package(
            &self,
            _search_path: &SearchPath,
            package: &str,
        ) -> crate::toolkit::Result<()> {
            self.journal
                .borrow_mut()
                .push(format!("homebrew install {package}"));
            Ok(())
        }

        fn bundle_install(
            &self,
            _search_path: &SearchPath,
            manifest: &Path,
        ) -> crate::toolkit::Result<()> {
            self.journal
                .borrow_mut()
                .push(format!("bundle install {}", manifest.display()));
            Ok(())
        }
    }

    struct FakeDotfileManager {
        journal: Journal,
        installed: Cell<bool>,
    }

    impl FakeDotfileManager {
        fn new(journal: Journal, installed: bool) -> Self {
            Self {
                journal,
                installed: Cell::new(installed),
            }
        }
    }

    impl DotfileManager for FakeDotfileManager {
        fn name(&self) -> &str {
            "chezmoi"
        }

        fn is_installed(&self, _search_path: &SearchPath) -> bool {
            self.installed.get()
        }

        fn install_standalone(
            &self,
            _search_path: &mut SearchPath,
            bin_dir: &Path,
        ) -> crate::toolkit::Result<()> {
            self.journal
                .borrow_mut()
                .push(format!("standalone install chezmoi to {}", bin_dir.display()));
            self.installed.set(true);
            Ok(())
        }

        fn init_from_remote(
            &self,
            _search_path: &SearchPath,
            url: &str,
        ) -> crate::toolkit::Result<()> {
            self.journal.borrow_mut().push(format!("init --apply {url}"));
            Ok(())
        }

        fn apply(&self, _search_path: &SearchPath) -> crate::toolkit::Result<()> {
            self.journal.borrow_mut().push("apply".into());
            Ok(())
        }
    }

    struct FakeContainerTool {
        journal: Journal,
        installed: Cell<bool>,
    }

    impl FakeContainerTool {
        fn new(journal: Journal, installed: bool) -> Self {
            Self {
                journal,
                installed: Cell::new(installed),
            }
        }
    }

    impl ContainerTool for FakeContainerTool {
        fn name(&self) -> &str {
            "distrobox"
        }

        fn is_installed(&self, _search_path: &SearchPath) -> bool {
            self.installed.get()
        }

        fn install_standalone(
            &self,
            _search_path: &mut SearchPath,
            bin_dir: &Path,
        ) -> crate::toolkit::Result<()> {
            self.journal.borrow_mut().push(format!(
                "standalone install distrobox to {}",
                bin_dir.display()
            ));
            self.installed.set(true);
            Ok(())
        }
    }

    struct DeclineAll;

    impl InstallGate for DeclineAll {
        fn confirm(&self, _tool: &str) -> Result<bool> {
            Ok(false)
        }
    }

    fn test_profile(manifest: impl Into<PathBuf>) -> BootstrapProfile {
        BootstrapProfile {
            settings: ProfileSettings {
                dotfiles_url: "https://blah.org/dotfiles.git".into(),
                manifest: manifest.into(),
                shell_profile: PathBuf::from("profile"),
                bin_dir: PathBuf::from("bin"),
            },
        }
    }

    fn facts(platform: Platform, immutable: bool) -> HostFacts {
        HostFacts {
            platform,
            immutable,
        }
    }

    #[sealed_test]
    fn standard_branch_full_provisioning_sequence() -> anyhow::Result<()> {
        std::fs::write("Brewfile", "brew \"ripgrep\"\n")?;
        let journal: Journal = Rc::new(RefCell::new(Vec::new()));

        let bootstrapper = Bootstrapper::new(
            facts(Platform::MacOs, false),
            test_profile("Brewfile"),
            SearchPath::default(),
            FakePackageManager::new(journal.clone(), false),
            FakeDotfileManager::new(journal.clone(), false),
            FakeContainerTool::new(journal.clone(), false),
            AssumeYes,
        );
        bootstrapper.run()?;

        let expect = vec![
            "bootstrap homebrew".to_string(),
            "homebrew install chezmoi".to_string(),
            "bundle install Brewfile".to_string(),
            "apply".to_string(),
        ];
        assert_eq!(*journal.borrow(), expect);

        Ok(())
    }

    #[sealed_test]
    fn immutable_branch_ignores_package_manager() -> anyhow::Result<()> {
        let journal: Journal = Rc::new(RefCell::new(Vec::new()));

        let bootstrapper = Bootstrapper::new(
            facts(Platform::Linux, true),
            test_profile("Brewfile"),
            SearchPath::default(),
            // Package manager is absent, and must stay untouched anyway.
            FakePackageManager::new(journal.clone(), false),
            FakeDotfileManager::new(journal.clone(), false),
            FakeContainerTool::new(journal.clone(), false),
            AssumeYes,
        );
        bootstrapper.run()?;

        let expect = vec![
            "standalone install distrobox to bin".to_string(),
            "standalone install chezmoi to bin".to_string(),
            "init --apply https://blah.org/dotfiles.git".to_string(),
        ];
        assert_eq!(*journal.borrow(), expect);

        Ok(())
    }

    #[sealed_test]
    fn provisioned_host_performs_no_installs() -> anyhow::Result<()> {
        std::fs::write("Brewfile", "brew \"ripgrep\"\n")?;
        let journal: Journal = Rc::new(RefCell::new(Vec::new()));

        let bootstrapper = Bootstrapper::new(
            facts(Platform::Linux, false),
            test_profile("Brewfile"),
            SearchPath::default(),
            FakePackageManager::new(journal.clone(), true),
            FakeDotfileManager::new(journal.clone(), true),
            FakeContainerTool::new(journal.clone(), true),
            // Gate would error the run if anything asked for an install.
            DeclineAll,
        );
        bootstrapper.run()?;

        let expect = vec!["bundle install Brewfile".to_string(), "apply".to_string()];
        assert_eq!(*journal.borrow(), expect);

        Ok(())
    }

    #[sealed_test]
    fn missing_manifest_still_reaches_apply() -> anyhow::Result<()> {
        let journal: Journal = Rc::new(RefCell::new(Vec::new()));

        let bootstrapper = Bootstrapper::new(
            facts(Platform::MacOs, false),
            test_profile("Brewfile"),
            SearchPath::default(),
            FakePackageManager::new(journal.clone(), true),
            FakeDotfileManager::new(journal.clone(), true),
            FakeContainerTool::new(journal.clone(), false),
            DeclineAll,
        );
        bootstrapper.run()?;

        let expect = vec!["apply".to_string()];
        assert_eq!(*journal.borrow(), expect);

        Ok(())
    }

    #[sealed_test]
    fn failed_bootstrap_stops_the_run() {
        let journal: Journal = Rc::new(RefCell::new(Vec::new()));

        let bootstrapper = Bootstrapper::new(
            facts(Platform::MacOs, false),
            test_profile("Brewfile"),
            SearchPath::default(),
            FakePackageManager::failing(journal.clone()),
            FakeDotfileManager::new(journal.clone(), false),
            FakeContainerTool::new(journal.clone(), false),
            AssumeYes,
        );
        let result = bootstrapper.run();

        assert!(matches!(result, Err(BootstrapError::Toolkit(_))));
        assert!(journal.borrow().is_empty());
    }

    #[sealed_test]
    fn declined_install_aborts_the_run() {
        let journal: Journal = Rc::new(RefCell::new(Vec::new()));

        let bootstrapper = Bootstrapper::new(
            facts(Platform::Linux, true),
            test_profile("Brewfile"),
            SearchPath::default(),
            FakePackageManager::new(journal.clone(), false),
            FakeDotfileManager::new(journal.clone(), false),
            FakeContainerTool::new(journal.clone(), false),
            DeclineAll,
        );
        let result = bootstrapper.run();

        assert!(matches!(
            result,
            Err(BootstrapError::InstallDeclined { tool }) if tool == "distrobox"
        ));
        assert!(journal.borrow().is_empty());
    }
}
