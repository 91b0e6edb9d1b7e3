// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::supervisor::DaemonCommand;

pub const DEFAULT_DAEMON_CONFIG_PATH: &str = "/etc/wpa_supplicant/wpa_supplicant.conf";
pub const DEFAULT_CERT_DIR: &str = "/etc/cert";
pub const DEFAULT_BOOT_PARAMS_PATH: &str = "/proc/cmdline";
pub const DEFAULT_DAEMON: &str = "/sbin/wpa_supplicant";

/// Which transport talks to the cluster store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
	/// The Kubernetes API via in-cluster or kubeconfig credentials.
	Kube,
	/// The kubectl command line tool.
	Kubectl,
}

/// wifi-bootstrap - bring up WiFi on a headless cluster node
#[derive(Parser, Debug)]
#[command(name = "wifi-bootstrap")]
pub struct Args {
	/// Host identity used to name the config record and secrets
	#[arg(long, env = "HOSTNAME", default_value = "")]
	pub host: String,

	/// Namespace of the records and secrets (defaults to the client's)
	#[arg(long, env = "POD_NAMESPACE")]
	pub namespace: Option<String>,

	/// Cluster store transport
	#[arg(long, env = "WIFI_BOOTSTRAP_STORE", value_enum, default_value_t = StoreBackend::Kube)]
	pub store: StoreBackend,

	/// kubectl command, may include leading words such as "k3s kubectl"
	#[arg(long, env = "WIFI_BOOTSTRAP_KUBECTL", default_value = "kubectl")]
	pub kubectl: String,

	/// Deadline for each cluster store call in seconds (0 disables)
	#[arg(long, env = "WIFI_BOOTSTRAP_CALL_TIMEOUT_SECS", default_value_t = 30)]
	pub call_timeout_secs: u64,

	/// Authentication daemon to supervise
	#[arg(long, env = "WIFI_BOOTSTRAP_DAEMON", default_value = DEFAULT_DAEMON)]
	pub daemon: PathBuf,

	/// Wireless interface listing tool
	#[arg(long, env = "WIFI_BOOTSTRAP_IWCONFIG", default_value = "iwconfig")]
	pub iwconfig: String,

	/// Emit logs as JSON lines
	#[arg(long, env = "WIFI_BOOTSTRAP_LOG_JSON")]
	pub log_json: bool,
}

/// Fixed local filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
	pub daemon_config: PathBuf,
	pub cert_dir: PathBuf,
	pub boot_params: PathBuf,
}

impl Default for Paths {
	fn default() -> Self {
		Self {
			daemon_config: PathBuf::from(DEFAULT_DAEMON_CONFIG_PATH),
			cert_dir: PathBuf::from(DEFAULT_CERT_DIR),
			boot_params: PathBuf::from(DEFAULT_BOOT_PARAMS_PATH),
		}
	}
}

/// Everything one bootstrap run needs, with the host identity carried
/// explicitly rather than read from the environment by each component.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
	pub host: String,
	pub paths: Paths,
	pub iwconfig: Vec<String>,
	pub daemon: DaemonCommand,
	pub call_timeout: Option<Duration>,
}

impl BootstrapConfig {
	pub fn new(host: impl Into<String>) -> Self {
		Self {
			host: host.into(),
			paths: Paths::default(),
			iwconfig: vec!["iwconfig".to_string()],
			daemon: DaemonCommand::new(DEFAULT_DAEMON),
			call_timeout: Some(Duration::from_secs(30)),
		}
	}
}

fn split_command(command: &str) -> Vec<String> {
	command.split_whitespace().map(str::to_string).collect()
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
	(secs > 0).then(|| Duration::from_secs(secs))
}

impl Args {
	pub fn call_timeout(&self) -> Option<Duration> {
		timeout_from_secs(self.call_timeout_secs)
	}

	pub fn kubectl_command(&self) -> Vec<String> {
		split_command(&self.kubectl)
	}

	pub fn to_config(&self) -> BootstrapConfig {
		BootstrapConfig {
			host: self.host.clone(),
			paths: Paths::default(),
			iwconfig: split_command(&self.iwconfig),
			daemon: DaemonCommand::new(self.daemon.clone()),
			call_timeout: self.call_timeout(),
		}
	}
}
