// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dotstrap development environment bootstrapper.
//!
//! Dotstrap detects the platform it landed on, then drives a package
//! manager, a dotfile manager, and a container-isolation tool in the right
//! order to produce a fully configured development environment. All of the
//! heavy provisioning lives inside those delegated tools; dotstrap owns the
//! detection, the dispatch, and nothing else.

pub mod bootstrap;
pub mod config;
pub mod path;
pub mod platform;
pub mod toolkit;
