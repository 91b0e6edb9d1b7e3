// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! One bootstrap run: discover, reconcile, materialize, supervise.

use std::path::PathBuf;

use tracing::{info, instrument, warn};
use wifi_bootstrap_k8s::{RecordStore, SecretStore};

use crate::boot_params::BootParams;
use crate::config::BootstrapConfig;
use crate::error::BootstrapError;
use crate::interface::InterfaceResolver;
use crate::materialize::{materialize_config, materialize_secrets, resolve_interface_field};
use crate::names::{CertKind, RecordNames};
use crate::reconcile::{ensure_config_record, ensure_secrets, RecordSource, SecretOutcome};
use crate::supervisor::{DaemonReport, Supervisor};

/// Local state ready for the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
	/// Interface from the config record, which may differ from the one
	/// detected on this boot when the record predates it.
	pub iface: String,
	pub config_path: PathBuf,
	pub record_source: RecordSource,
	/// One entry per secret whose reconciliation did not fail.
	pub secrets: Vec<(CertKind, SecretOutcome)>,
	pub certificates: Vec<PathBuf>,
}

pub struct Bootstrap<S> {
	store: S,
	config: BootstrapConfig,
	names: RecordNames,
}

impl<S> Bootstrap<S>
where
	S: RecordStore + SecretStore,
{
	pub fn new(store: S, config: BootstrapConfig) -> Self {
		let names = RecordNames::new(config.host.clone());
		Self {
			store,
			config,
			names,
		}
	}

	pub fn names(&self) -> &RecordNames {
		&self.names
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	/// Everything up to, but not including, the daemon launch.
	///
	/// Secret reconciliation failures are logged and tolerated; any other
	/// failure is returned and nothing further runs.
	#[instrument(skip_all, fields(host = %self.names.host()))]
	pub async fn prepare(&self) -> Result<Prepared, BootstrapError> {
		let paths = &self.config.paths;

		let detected = InterfaceResolver::new(self.config.iwconfig.clone(), self.config.call_timeout)
			.resolve()
			.await;
		let params = BootParams::read(&paths.boot_params).await;

		let record = self.names.config_record();
		let record_source = ensure_config_record(&self.store, &record, &params, &detected).await?;
		let secrets =
			ensure_secrets(&self.store, |kind| self.names.secret(kind), &paths.cert_dir).await;

		materialize_config(&self.store, &record, &paths.daemon_config).await?;
		let iface = resolve_interface_field(&self.store, &record).await?;
		if iface != detected {
			warn!(
				detected = %detected,
				configured = %iface,
				"config record interface differs from the detected one, using the record's"
			);
		}
		let certificates =
			materialize_secrets(&self.store, |kind| self.names.secret(kind), &paths.cert_dir).await?;

		Ok(Prepared {
			iface,
			config_path: paths.daemon_config.clone(),
			record_source,
			secrets,
			certificates,
		})
	}

	/// Prepares the host and then runs the daemon in the foreground until it
	/// exits.
	pub async fn run(
		&self,
	) -> Result<DaemonReport<tokio::io::Stdout, tokio::io::Stderr>, BootstrapError> {
		let prepared = self.prepare().await?;
		info!(
			iface = %prepared.iface,
			certificates = prepared.certificates.len(),
			"host prepared, starting daemon"
		);
		let mut supervisor = Supervisor::new(self.config.daemon.clone());
		Ok(supervisor.run(&prepared.iface, &prepared.config_path).await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Paths;
	use crate::names::{DAEMON_CONFIG_FIELD, INTERFACE_FIELD};
	use crate::wpa::BLANK_TEMPLATE;
	use std::collections::BTreeMap;
	use tempfile::TempDir;
	use wifi_bootstrap_k8s::MemoryStore;

	fn config_in(dir: &TempDir, cmdline: &str) -> BootstrapConfig {
		let boot_params = dir.path().join("cmdline");
		std::fs::write(&boot_params, cmdline).unwrap();
		let mut config = BootstrapConfig::new("node-1");
		config.paths = Paths {
			daemon_config: dir.path().join("wpa_supplicant").join("wpa_supplicant.conf"),
			cert_dir: dir.path().join("cert"),
			boot_params,
		};
		config.iwconfig = vec![
			"sh".to_string(),
			"-c".to_string(),
			"echo 'wlp1s0    IEEE 802.11  ESSID:off/any'".to_string(),
		];
		config
	}

	#[tokio::test]
	async fn prepare_creates_and_writes_config() {
		let dir = TempDir::new().unwrap();
		let store = MemoryStore::new();
		let bootstrap = Bootstrap::new(
			store.clone(),
			config_in(&dir, "quiet --wifi-ssid=Home --wifi-password=secret"),
		);

		let prepared = bootstrap.prepare().await.unwrap();

		assert_eq!(prepared.iface, "wlp1s0");
		assert_eq!(prepared.record_source, RecordSource::Credentials);
		assert!(prepared.certificates.is_empty());
		let written = std::fs::read_to_string(&prepared.config_path).unwrap();
		assert!(written.contains("ssid=\"Home\""));
		assert_eq!(
			store.record("node-1-wifi-config").unwrap()[INTERFACE_FIELD],
			"wlp1s0"
		);
	}

	#[tokio::test]
	async fn existing_record_interface_wins_over_detected() {
		let dir = TempDir::new().unwrap();
		let store = MemoryStore::new();
		store.insert_record(
			"node-1-wifi-config",
			BTreeMap::from([
				(DAEMON_CONFIG_FIELD.to_string(), "network={}\n".to_string()),
				(INTERFACE_FIELD.to_string(), "wlan3".to_string()),
			]),
		);
		let bootstrap = Bootstrap::new(store.clone(), config_in(&dir, ""));

		let prepared = bootstrap.prepare().await.unwrap();

		assert_eq!(prepared.iface, "wlan3");
		assert_eq!(prepared.record_source, RecordSource::Existing);
		assert_eq!(prepared.secrets.len(), 3);
		assert_eq!(store.record_create_calls(), 0);
		assert_eq!(
			std::fs::read_to_string(&prepared.config_path).unwrap(),
			"network={}\n"
		);
	}

	#[tokio::test]
	async fn blank_template_without_credentials() {
		let dir = TempDir::new().unwrap();
		let store = MemoryStore::new();
		let bootstrap = Bootstrap::new(store.clone(), config_in(&dir, "root=/dev/mmcblk0p2"));

		let prepared = bootstrap.prepare().await.unwrap();

		assert_eq!(prepared.record_source, RecordSource::BlankTemplate);
		assert_eq!(
			std::fs::read_to_string(&prepared.config_path).unwrap(),
			BLANK_TEMPLATE
		);
	}

	#[tokio::test]
	async fn record_lookup_failure_stops_before_writing() {
		let dir = TempDir::new().unwrap();
		let store = MemoryStore::new();
		store.fail_object("node-1-wifi-config");
		let config = config_in(&dir, "");
		let dest = config.paths.daemon_config.clone();
		let bootstrap = Bootstrap::new(store, config);

		let err = bootstrap.prepare().await.unwrap_err();

		assert!(matches!(err, BootstrapError::RecordLookup { .. }));
		assert!(!dest.exists());
	}
}
