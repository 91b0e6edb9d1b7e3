// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Cluster store abstraction for WiFi bootstrap.
//!
//! This crate provides:
//! - Trait-based access to ConfigMaps ([`RecordStore`]) and Secrets
//!   ([`SecretStore`]) for testability
//! - A production implementation using the kube crate and one that drives
//!   the kubectl CLI
//! - A per-call deadline wrapper and an in-memory mock

mod client;
mod deadline;
mod error;
mod kube_client;
mod kubectl_client;
mod memory;
mod types;

pub use client::{RecordStore, SecretStore};
pub use deadline::DeadlineStore;
pub use error::{K8sError, K8sResult};
pub use kube_client::KubeClient;
pub use kubectl_client::KubectlClient;
pub use memory::MemoryStore;
pub use types::{
	config_map_manifest, secret_manifest, ConfigMap, Secret, MANAGED_BY_LABEL, MANAGED_BY_VALUE,
};
pub use wifi_bootstrap_secret::SecretBytes;
