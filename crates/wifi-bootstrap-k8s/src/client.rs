// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use async_trait::async_trait;
use wifi_bootstrap_secret::SecretBytes;

use crate::error::K8sError;

/// Named, field-structured configuration records (ConfigMaps).
///
/// Implementations exist for the K8s API, the kubectl CLI and an in-memory
/// mock, so the bootstrap flow can be exercised without a cluster.
#[async_trait]
pub trait RecordStore: Send + Sync {
	/// Whether a record with this name exists.
	///
	/// Returns `Ok(false)` only when the store reports the record absent;
	/// transport failures are errors.
	async fn record_exists(&self, name: &str) -> Result<bool, K8sError>;

	/// Create a record. Fails with [`K8sError::AlreadyExists`] instead of
	/// overwriting.
	async fn create_record(
		&self,
		name: &str,
		fields: BTreeMap<String, String>,
	) -> Result<(), K8sError>;

	/// Read one text field of a record.
	async fn read_record_field(&self, name: &str, field: &str) -> Result<String, K8sError>;
}

/// Named secret material (Secrets) holding raw bytes.
#[async_trait]
pub trait SecretStore: Send + Sync {
	/// Whether a secret with this name exists.
	async fn secret_exists(&self, name: &str) -> Result<bool, K8sError>;

	/// Create a secret with a single data key.
	async fn create_secret(&self, name: &str, key: &str, content: &[u8]) -> Result<(), K8sError>;

	/// Read one data key of a secret, decoded to raw bytes.
	async fn read_secret_field(&self, name: &str, key: &str) -> Result<SecretBytes, K8sError>;
}
