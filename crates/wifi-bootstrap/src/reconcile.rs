// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Ensures the host's config record and certificate secrets exist.
//!
//! Reconciliation only ever creates: an existing record or secret is left
//! untouched, whatever its contents.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{error, info, instrument, warn};
use wifi_bootstrap_k8s::{RecordStore, SecretStore};

use crate::boot_params::BootParams;
use crate::error::BootstrapError;
use crate::names::{CertKind, DAEMON_CONFIG_FIELD, INTERFACE_FIELD};
use crate::wpa::{Network, WpaConfig, BLANK_TEMPLATE};

/// How the config record came to exist for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
	/// The record was already present and was not modified.
	Existing,
	/// Created from boot-time credentials.
	Credentials,
	/// Created from the blank template.
	BlankTemplate,
}

/// Result of reconciling one certificate secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOutcome {
	/// The store already has the secret.
	Present,
	/// Created from the local certificate file.
	Created,
	/// Absent from the store and no local file to create it from.
	MissingLocalFile,
}

/// Creates the named record unless it already exists.
///
/// Credentials are used only when both the SSID and the password are
/// non-empty; anything less falls through to the blank template.
#[instrument(skip_all, fields(name = %name, iface = %iface))]
pub async fn ensure_config_record<S>(
	store: &S,
	name: &str,
	params: &BootParams,
	iface: &str,
) -> Result<RecordSource, BootstrapError>
where
	S: RecordStore + ?Sized,
{
	let exists = store
		.record_exists(name)
		.await
		.map_err(|source| BootstrapError::RecordLookup {
			name: name.to_string(),
			source,
		})?;
	if exists {
		info!("config record already exists");
		return Ok(RecordSource::Existing);
	}

	let (daemon_config, source) = match params.credentials() {
		Some((ssid, password)) => {
			info!(ssid, "creating config record from boot parameters");
			let network = Network::new(ssid, password.clone())?;
			(
				WpaConfig::new().with_network(network).render(),
				RecordSource::Credentials,
			)
		}
		None => {
			info!("no wifi credentials in boot parameters, creating blank config record");
			(BLANK_TEMPLATE.to_string(), RecordSource::BlankTemplate)
		}
	};

	let fields = BTreeMap::from([
		(DAEMON_CONFIG_FIELD.to_string(), daemon_config),
		(INTERFACE_FIELD.to_string(), iface.to_string()),
	]);
	store
		.create_record(name, fields)
		.await
		.map_err(|source| BootstrapError::RecordCreate {
			name: name.to_string(),
			source,
		})?;

	Ok(source)
}

/// Creates the secret from `local_path` if the store lacks it.
///
/// A missing local file is not an error: the skip is reported and the run
/// carries on.
#[instrument(skip_all, fields(secret = %name, path = %local_path.display()))]
pub async fn ensure_secret<S>(
	store: &S,
	name: &str,
	kind: CertKind,
	local_path: &Path,
) -> Result<SecretOutcome, BootstrapError>
where
	S: SecretStore + ?Sized,
{
	let exists = store
		.secret_exists(name)
		.await
		.map_err(|source| BootstrapError::SecretLookup {
			name: name.to_string(),
			source,
		})?;
	if exists {
		return Ok(SecretOutcome::Present);
	}

	let content = match tokio::fs::read(local_path).await {
		Ok(content) => content,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			warn!("certificate file does not exist, not creating secret");
			return Ok(SecretOutcome::MissingLocalFile);
		}
		Err(source) => {
			return Err(BootstrapError::CertificateRead {
				path: local_path.to_path_buf(),
				source,
			})
		}
	};

	store
		.create_secret(name, kind.file_name(), &content)
		.await
		.map_err(|source| BootstrapError::SecretCreate {
			name: name.to_string(),
			source,
		})?;

	info!(bytes = content.len(), "created secret from certificate file");
	Ok(SecretOutcome::Created)
}

/// Reconciles every certificate secret independently.
///
/// Failures are logged per secret and never abort the run; the outcome list
/// has one entry per [`CertKind`] that did not fail.
pub async fn ensure_secrets<S, F>(
	store: &S,
	secret_name: F,
	cert_dir: &Path,
) -> Vec<(CertKind, SecretOutcome)>
where
	S: SecretStore + ?Sized,
	F: Fn(CertKind) -> String,
{
	let mut outcomes = Vec::with_capacity(CertKind::ALL.len());
	for kind in CertKind::ALL {
		let name = secret_name(kind);
		let path = cert_dir.join(kind.file_name());
		match ensure_secret(store, &name, kind, &path).await {
			Ok(outcome) => outcomes.push((kind, outcome)),
			Err(e) => {
				error!(
					secret = %name,
					error = %e,
					timed_out = e.is_timeout(),
					"failed to reconcile secret"
				);
			}
		}
	}
	outcomes
}
