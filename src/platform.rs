// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Host platform detection.
//!
//! Figure out what kind of host the bootstrapper landed on before any
//! provisioning begins. Detection happens exactly once per run, and the
//! answers stay fixed for the lifetime of the process.
//!
//! # Platforms and Variants
//!
//! Two platforms are recognized: macOS and Linux. The kernel name reported
//! by uname(1) decides which one we are on. Any other kernel name means the
//! host is unsupported, full stop.
//!
//! Linux hosts come in two variants: standard, and immutable. An
//! __immutable__ distribution keeps its base file system read-only, so
//! packages cannot be installed onto the host directly. Tooling has to live
//! in a mutable container bridged into the host instead. Every ostree-based
//! distribution writes the marker file `/run/ostree-booted` at boot, which
//! makes the marker probe a reliable variant check without caring about
//! which flavor of immutable distribution is underneath.
//!
//! # See Also
//!
//! 1. [ostree docs](https://ostreedev.github.io/ostree/)

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
    process::Command,
};
use tracing::debug;

/// Marker file written at boot by every ostree-based distribution.
pub const IMMUTABLE_MARKER: &str = "/run/ostree-booted";

/// Recognized host platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Darwin kernel.
    MacOs,

    /// Linux kernel, standard or immutable variant.
    Linux,
}

impl Display for Platform {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::MacOs => fmt.write_str("macOS"),
            Self::Linux => fmt.write_str("Linux"),
        }
    }
}

/// Facts about the host, derived once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostFacts {
    /// Platform the host runs on.
    pub platform: Platform,

    /// Whether the host is an immutable Linux variant.
    ///
    /// Always `false` on macOS.
    pub immutable: bool,
}

impl HostFacts {
    /// Check if host needs the containerized provisioning branch.
    pub fn is_immutable_linux(&self) -> bool {
        matches!(self.platform, Platform::Linux) && self.immutable
    }
}

impl Display for HostFacts {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        if self.is_immutable_linux() {
            write!(fmt, "{} (immutable)", self.platform)
        } else {
            write!(fmt, "{}", self.platform)
        }
    }
}

/// Layer of indirection for host environment queries.
///
/// Lets the detection logic be exercised against fake hosts without running
/// uname(1) or poking at the root file system.
pub trait HostProbe {
    /// Report the kernel name of the host.
    ///
    /// # Errors
    ///
    /// - Return [`DetectError::Syscall`] if the kernel name cannot be
    ///   queried.
    fn kernel_name(&self) -> Result<String>;

    /// Check for the immutable distribution marker.
    fn is_immutable_os(&self) -> bool;
}

/// Host probe backed by uname(1) and the root file system.
#[derive(Debug, Default)]
pub struct UnameProbe;

impl UnameProbe {
    /// Construct new uname probe.
    pub fn new() -> Self {
        Self
    }
}

impl HostProbe for UnameProbe {
    fn kernel_name(&self) -> Result<String> {
        let output = Command::new("uname")
            .arg("-s")
            .output()
            .map_err(DetectError::Syscall)?;
        if !output.status.success() {
            return Err(DetectError::Syscall(std::io::Error::other(
                "command \"uname\" failed",
            )));
        }

        Ok(String::from_utf8_lossy(output.stdout.as_slice())
            .trim()
            .to_owned())
    }

    fn is_immutable_os(&self) -> bool {
        Path::new(IMMUTABLE_MARKER).exists()
    }
}

/// Detect platform and variant of the host.
///
/// Maps the kernel name to a recognized platform, then checks the immutable
/// marker on Linux hosts only. Marker presence on anything other than Linux
/// is ignored.
///
/// # Errors
///
/// - Return [`DetectError::UnsupportedKernel`] if the kernel name matches
///   neither recognized platform.
/// - Return [`DetectError::Syscall`] if the kernel name cannot be queried.
pub fn detect(probe: &impl HostProbe) -> Result<HostFacts> {
    let kernel = probe.kernel_name()?;
    debug!("kernel name reported as {kernel:?}");

    let platform = match kernel.as_str() {
        "Darwin" => Platform::MacOs,
        "Linux" => Platform::Linux,
        _ => return Err(DetectError::UnsupportedKernel(kernel)),
    };

    // INVARIANT: Marker probe only matters on Linux.
    let immutable = matches!(platform, Platform::Linux) && probe.is_immutable_os();
    debug!("detected {platform} host, immutable: {immutable}");

    Ok(HostFacts {
        platform,
        immutable,
    })
}

/// Host detection error types.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// Kernel name matches neither recognized platform.
    #[error("unsupported kernel {0:?}, expected \"Darwin\" or \"Linux\"")]
    UnsupportedKernel(String),

    /// Kernel name query fails outright.
    #[error(transparent)]
    Syscall(#[from] std::io::Error),
}

/// Friendly result alias :3
pub type Result<T, E = DetectError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    struct FakeProbe {
        kernel: &'static str,
        marker: bool,
    }

    impl HostProbe for FakeProbe {
        fn kernel_name(&self) -> Result<String> {
            Ok(self.kernel.to_owned())
        }

        fn is_immutable_os(&self) -> bool {
            self.marker
        }
    }

    #[test_case("Darwin", false, Platform::MacOs, false; "darwin standard")]
    #[test_case("Linux", false, Platform::Linux, false; "linux standard")]
    #[test_case("Linux", true, Platform::Linux, true; "linux immutable")]
    #[test_case("Darwin", true, Platform::MacOs, false; "marker ignored on darwin")]
    #[test]
    fn detect_maps_kernel_names(
        kernel: &'static str,
        marker: bool,
        platform: Platform,
        immutable: bool,
    ) {
        let probe = FakeProbe { kernel, marker };
        let result = detect(&probe).unwrap();
        assert_eq!(
            result,
            HostFacts {
                platform,
                immutable
            }
        );
    }

    #[test_case("FreeBSD"; "freebsd")]
    #[test_case("SunOS"; "sunos")]
    #[test_case(""; "empty")]
    #[test]
    fn detect_rejects_unknown_kernels(kernel: &'static str) {
        let probe = FakeProbe {
            kernel,
            marker: false,
        };
        let result = detect(&probe);
        assert!(matches!(result, Err(DetectError::UnsupportedKernel(_))));
    }

    #[test]
    fn immutable_linux_selects_container_branch() {
        let facts = HostFacts {
            platform: Platform::Linux,
            immutable: true,
        };
        assert!(facts.is_immutable_linux());

        let facts = HostFacts {
            platform: Platform::Linux,
            immutable: false,
        };
        assert!(!facts.is_immutable_linux());

        let facts = HostFacts {
            platform: Platform::MacOs,
            immutable: false,
        };
        assert!(!facts.is_immutable_linux());
    }
}
