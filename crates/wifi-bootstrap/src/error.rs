// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use thiserror::Error;
use wifi_bootstrap_k8s::K8sError;

use crate::wpa::WpaConfigError;

/// Fatal conditions that end a bootstrap run.
#[derive(Debug, Error)]
pub enum BootstrapError {
	#[error("failed to look up config record {name}: {source}")]
	RecordLookup { name: String, source: K8sError },

	#[error("failed to create config record {name}: {source}")]
	RecordCreate { name: String, source: K8sError },

	#[error("failed to read {field} from config record {name}: {source}")]
	RecordRead {
		name: String,
		field: &'static str,
		source: K8sError,
	},

	#[error("config record {name} has an empty {field} field")]
	EmptyField { name: String, field: &'static str },

	#[error("cannot render wifi credentials: {0}")]
	Credentials(#[from] WpaConfigError),

	#[error("failed to look up secret {name}: {source}")]
	SecretLookup { name: String, source: K8sError },

	#[error("failed to create secret {name}: {source}")]
	SecretCreate { name: String, source: K8sError },

	#[error("failed to read secret {name}: {source}")]
	SecretRead { name: String, source: K8sError },

	#[error("failed to read certificate file {path}: {source}")]
	CertificateRead {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("failed to write {path}: {source}")]
	Write {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error(transparent)]
	Daemon(#[from] SupervisorError),
}

impl BootstrapError {
	/// Whether the failure came from a store call exceeding its deadline.
	pub fn is_timeout(&self) -> bool {
		match self {
			BootstrapError::RecordLookup { source, .. }
			| BootstrapError::RecordCreate { source, .. }
			| BootstrapError::RecordRead { source, .. }
			| BootstrapError::SecretLookup { source, .. }
			| BootstrapError::SecretCreate { source, .. }
			| BootstrapError::SecretRead { source, .. } => matches!(source, K8sError::Timeout),
			_ => false,
		}
	}
}

/// Errors from launching or relaying the daemon process.
#[derive(Debug, Error)]
pub enum SupervisorError {
	#[error("failed to launch {program}: {source}")]
	Launch {
		program: String,
		source: std::io::Error,
	},

	#[error("daemon {stream} pipe was not captured")]
	MissingPipe { stream: &'static str },

	#[error("failed waiting for daemon: {0}")]
	Wait(std::io::Error),

	#[error("{stream} relay task failed: {message}")]
	Relay {
		stream: &'static str,
		message: String,
	},
}
