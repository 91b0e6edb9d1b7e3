// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Writes the host's record and secrets to the local filesystem.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use wifi_bootstrap_k8s::{RecordStore, SecretBytes, SecretStore};

use crate::error::BootstrapError;
use crate::names::{CertKind, DAEMON_CONFIG_FIELD, INTERFACE_FIELD};

pub const FILE_MODE: u32 = 0o644;
pub const DIR_MODE: u32 = 0o755;

/// Creates `dir` (and parents) with [`DIR_MODE`].
async fn ensure_dir(dir: &Path) -> Result<(), BootstrapError> {
	let write_err = |source| BootstrapError::Write {
		path: dir.to_path_buf(),
		source,
	};
	tokio::fs::DirBuilder::new()
		.recursive(true)
		.mode(DIR_MODE)
		.create(dir)
		.await
		.map_err(write_err)?;
	tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(DIR_MODE))
		.await
		.map_err(write_err)
}

/// Writes `contents` to `path` with [`FILE_MODE`], creating the parent
/// directory if needed.
async fn write_file(path: &Path, contents: &[u8]) -> Result<(), BootstrapError> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		if !tokio::fs::try_exists(parent).await.unwrap_or(false) {
			ensure_dir(parent).await?;
		}
	}
	let write_err = |source| BootstrapError::Write {
		path: path.to_path_buf(),
		source,
	};
	tokio::fs::write(path, contents).await.map_err(write_err)?;
	tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(FILE_MODE))
		.await
		.map_err(write_err)
}

/// Writes the record's daemon configuration verbatim to `dest`.
#[instrument(skip_all, fields(name = %name, dest = %dest.display()))]
pub async fn materialize_config<S>(store: &S, name: &str, dest: &Path) -> Result<(), BootstrapError>
where
	S: RecordStore + ?Sized,
{
	let config = store
		.read_record_field(name, DAEMON_CONFIG_FIELD)
		.await
		.map_err(|source| BootstrapError::RecordRead {
			name: name.to_string(),
			field: DAEMON_CONFIG_FIELD,
			source,
		})?;

	write_file(dest, config.as_bytes()).await?;
	info!(bytes = config.len(), "wrote daemon configuration");
	Ok(())
}

/// Reads the interface the daemon must bind to. Empty is an error.
#[instrument(skip_all, fields(name = %name))]
pub async fn resolve_interface_field<S>(store: &S, name: &str) -> Result<String, BootstrapError>
where
	S: RecordStore + ?Sized,
{
	let iface = store
		.read_record_field(name, INTERFACE_FIELD)
		.await
		.map_err(|source| BootstrapError::RecordRead {
			name: name.to_string(),
			field: INTERFACE_FIELD,
			source,
		})?;

	let iface = iface.trim();
	if iface.is_empty() {
		return Err(BootstrapError::EmptyField {
			name: name.to_string(),
			field: INTERFACE_FIELD,
		});
	}
	info!(iface, "using wireless interface from config record");
	Ok(iface.to_string())
}

/// Writes every stored certificate secret into `cert_dir`.
///
/// Secrets the store does not have are skipped. All present secrets are
/// fetched before anything is written, so a failed read leaves no
/// certificate files behind. Returns the paths written.
#[instrument(skip_all, fields(cert_dir = %cert_dir.display()))]
pub async fn materialize_secrets<S, F>(
	store: &S,
	secret_name: F,
	cert_dir: &Path,
) -> Result<Vec<PathBuf>, BootstrapError>
where
	S: SecretStore + ?Sized,
	F: Fn(CertKind) -> String,
{
	ensure_dir(cert_dir).await?;

	let mut fetched: Vec<(PathBuf, SecretBytes)> = Vec::with_capacity(CertKind::ALL.len());
	for kind in CertKind::ALL {
		let name = secret_name(kind);
		let exists = store
			.secret_exists(&name)
			.await
			.map_err(|source| BootstrapError::SecretLookup {
				name: name.clone(),
				source,
			})?;
		if !exists {
			warn!(secret = %name, "secret not in store, nothing to mount");
			continue;
		}

		let content = store
			.read_secret_field(&name, kind.file_name())
			.await
			.map_err(|source| BootstrapError::SecretRead {
				name: name.clone(),
				source,
			})?;
		debug!(secret = %name, bytes = content.len(), "fetched secret");
		fetched.push((cert_dir.join(kind.file_name()), content));
	}

	let mut written = Vec::with_capacity(fetched.len());
	for (path, content) in fetched {
		write_file(&path, content.expose()).await?;
		written.push(path);
	}
	info!(count = written.len(), "mounted certificate secrets");
	Ok(written)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;
	use tempfile::TempDir;
	use wifi_bootstrap_k8s::MemoryStore;

	const NAME: &str = "h-wifi-config";

	fn secret_name(kind: CertKind) -> String {
		format!("h-wifi-{}", kind.suffix())
	}

	fn mode(path: &Path) -> u32 {
		std::fs::metadata(path).unwrap().permissions().mode() & 0o777
	}

	fn store_with_record(config: &str, iface: &str) -> MemoryStore {
		let store = MemoryStore::new();
		store.insert_record(
			NAME,
			BTreeMap::from([
				(DAEMON_CONFIG_FIELD.to_string(), config.to_string()),
				(INTERFACE_FIELD.to_string(), iface.to_string()),
			]),
		);
		store
	}

	#[tokio::test]
	async fn config_is_written_verbatim_with_mode() {
		let store = store_with_record("network={\n\tssid=\"x\"\n}\n", "wlan0");
		let dir = TempDir::new().unwrap();
		let dest = dir.path().join("wpa_supplicant").join("wpa_supplicant.conf");

		materialize_config(&store, NAME, &dest).await.unwrap();

		assert_eq!(
			std::fs::read_to_string(&dest).unwrap(),
			"network={\n\tssid=\"x\"\n}\n"
		);
		assert_eq!(mode(&dest), FILE_MODE);
		assert_eq!(mode(dest.parent().unwrap()), DIR_MODE);
	}

	#[tokio::test]
	async fn missing_config_field_is_fatal() {
		let store = MemoryStore::new();
		store.insert_record(NAME, BTreeMap::new());
		let dir = TempDir::new().unwrap();
		let dest = dir.path().join("wpa.conf");

		let err = materialize_config(&store, NAME, &dest).await.unwrap_err();

		assert!(matches!(err, BootstrapError::RecordRead { field, .. } if field == DAEMON_CONFIG_FIELD));
		assert!(!dest.exists());
	}

	#[tokio::test]
	async fn interface_field_is_trimmed() {
		let store = store_with_record("", "wlp2s0\n");
		assert_eq!(resolve_interface_field(&store, NAME).await.unwrap(), "wlp2s0");
	}

	#[tokio::test]
	async fn empty_interface_field_is_fatal() {
		let store = store_with_record("", "  ");
		let err = resolve_interface_field(&store, NAME).await.unwrap_err();
		assert!(matches!(err, BootstrapError::EmptyField { .. }));
	}

	#[tokio::test]
	async fn secrets_are_mounted_into_cert_dir() {
		let store = MemoryStore::new();
		store.insert_secret("h-wifi-ca-cert", "ca.pem", b"ca");
		store.insert_secret("h-wifi-client-cert", "user.pem", b"cert");
		store.insert_secret("h-wifi-client-key", "user.prv", b"key");
		let dir = TempDir::new().unwrap();
		let cert_dir = dir.path().join("cert");

		let written = materialize_secrets(&store, secret_name, &cert_dir).await.unwrap();

		assert_eq!(written.len(), 3);
		assert_eq!(std::fs::read(cert_dir.join("ca.pem")).unwrap(), b"ca");
		assert_eq!(std::fs::read(cert_dir.join("user.pem")).unwrap(), b"cert");
		assert_eq!(std::fs::read(cert_dir.join("user.prv")).unwrap(), b"key");
		assert_eq!(mode(&cert_dir), DIR_MODE);
		assert_eq!(mode(&cert_dir.join("user.prv")), FILE_MODE);
	}

	#[tokio::test]
	async fn absent_secrets_are_skipped() {
		let store = MemoryStore::new();
		store.insert_secret("h-wifi-ca-cert", "ca.pem", b"ca");
		let dir = TempDir::new().unwrap();

		let written = materialize_secrets(&store, secret_name, dir.path()).await.unwrap();

		assert_eq!(written, vec![dir.path().join("ca.pem")]);
		assert!(!dir.path().join("user.pem").exists());
	}

	#[tokio::test]
	async fn one_bad_secret_aborts_before_writing() {
		let store = MemoryStore::new();
		store.insert_secret("h-wifi-ca-cert", "ca.pem", b"ca");
		store.insert_secret("h-wifi-client-key", "wrong-key", b"key");
		let dir = TempDir::new().unwrap();

		let err = materialize_secrets(&store, secret_name, dir.path())
			.await
			.unwrap_err();

		assert!(matches!(err, BootstrapError::SecretRead { name, .. } if name == "h-wifi-client-key"));
		assert!(!dir.path().join("ca.pem").exists());
	}
}
