// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! WiFi bootstrap for headless cluster nodes.
//!
//! On startup the host's config record and certificate secrets are created
//! in the cluster store if missing, written to the local filesystem, and the
//! wpa_supplicant daemon is run in the foreground against them.

pub mod boot_params;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod interface;
pub mod materialize;
pub mod names;
pub mod reconcile;
pub mod supervisor;
pub mod wpa;

pub use boot_params::BootParams;
pub use bootstrap::{Bootstrap, Prepared};
pub use config::{Args, BootstrapConfig, Paths, StoreBackend};
pub use error::{BootstrapError, SupervisorError};
pub use interface::{InterfaceResolver, FALLBACK_INTERFACE};
pub use names::{CertKind, RecordNames, DAEMON_CONFIG_FIELD, INTERFACE_FIELD};
pub use reconcile::{RecordSource, SecretOutcome};
pub use supervisor::{DaemonCommand, DaemonReport, DaemonState, Supervisor};
pub use wpa::{Network, WpaConfig, WpaConfigError, BLANK_TEMPLATE};
