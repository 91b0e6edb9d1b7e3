// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-memory store used to exercise the bootstrap flow without a cluster.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use wifi_bootstrap_secret::SecretBytes;

use crate::client::{RecordStore, SecretStore};
use crate::error::K8sError;

#[derive(Debug, Default)]
struct MemoryState {
	records: HashMap<String, BTreeMap<String, String>>,
	secrets: HashMap<String, BTreeMap<String, Vec<u8>>>,
	record_creates: usize,
	secret_creates: usize,
	failing: HashSet<String>,
	latency: Option<Duration>,
}

/// A mock store backed by hash maps.
///
/// Clones share state, so a test can keep a handle for assertions while the
/// code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn state(&self) -> MutexGuard<'_, MemoryState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Seed a record without counting it as a create call.
	pub fn insert_record(&self, name: &str, fields: BTreeMap<String, String>) {
		self.state().records.insert(name.to_string(), fields);
	}

	/// Seed a secret without counting it as a create call.
	pub fn insert_secret(&self, name: &str, key: &str, content: &[u8]) {
		self
			.state()
			.secrets
			.entry(name.to_string())
			.or_default()
			.insert(key.to_string(), content.to_vec());
	}

	/// Make every operation on the named object fail with an API error.
	pub fn fail_object(&self, name: &str) {
		self.state().failing.insert(name.to_string());
	}

	/// Delay every operation, for exercising deadlines.
	pub fn set_latency(&self, latency: Duration) {
		self.state().latency = Some(latency);
	}

	pub fn record(&self, name: &str) -> Option<BTreeMap<String, String>> {
		self.state().records.get(name).cloned()
	}

	pub fn secret(&self, name: &str, key: &str) -> Option<Vec<u8>> {
		self
			.state()
			.secrets
			.get(name)
			.and_then(|data| data.get(key))
			.cloned()
	}

	pub fn record_create_calls(&self) -> usize {
		self.state().record_creates
	}

	pub fn secret_create_calls(&self) -> usize {
		self.state().secret_creates
	}

	/// Applies latency and injected failures ahead of an operation.
	async fn enter(&self, name: &str) -> Result<(), K8sError> {
		let (latency, failing) = {
			let state = self.state();
			(state.latency, state.failing.contains(name))
		};
		if let Some(latency) = latency {
			tokio::time::sleep(latency).await;
		}
		if failing {
			return Err(K8sError::ApiError {
				message: format!("injected failure for {name}"),
			});
		}
		Ok(())
	}
}

#[async_trait]
impl RecordStore for MemoryStore {
	async fn record_exists(&self, name: &str) -> Result<bool, K8sError> {
		self.enter(name).await?;
		Ok(self.state().records.contains_key(name))
	}

	async fn create_record(
		&self,
		name: &str,
		fields: BTreeMap<String, String>,
	) -> Result<(), K8sError> {
		self.enter(name).await?;
		let mut state = self.state();
		state.record_creates += 1;
		if state.records.contains_key(name) {
			return Err(K8sError::AlreadyExists { name: name.into() });
		}
		state.records.insert(name.to_string(), fields);
		Ok(())
	}

	async fn read_record_field(&self, name: &str, field: &str) -> Result<String, K8sError> {
		self.enter(name).await?;
		let state = self.state();
		let record = state
			.records
			.get(name)
			.ok_or_else(|| K8sError::ConfigMapNotFound { name: name.into() })?;
		record
			.get(field)
			.cloned()
			.ok_or_else(|| K8sError::FieldMissing {
				name: name.into(),
				field: field.into(),
			})
	}
}

#[async_trait]
impl SecretStore for MemoryStore {
	async fn secret_exists(&self, name: &str) -> Result<bool, K8sError> {
		self.enter(name).await?;
		Ok(self.state().secrets.contains_key(name))
	}

	async fn create_secret(&self, name: &str, key: &str, content: &[u8]) -> Result<(), K8sError> {
		self.enter(name).await?;
		let mut state = self.state();
		state.secret_creates += 1;
		if state.secrets.contains_key(name) {
			return Err(K8sError::AlreadyExists { name: name.into() });
		}
		state.secrets.insert(
			name.to_string(),
			BTreeMap::from([(key.to_string(), content.to_vec())]),
		);
		Ok(())
	}

	async fn read_secret_field(&self, name: &str, key: &str) -> Result<SecretBytes, K8sError> {
		self.enter(name).await?;
		let state = self.state();
		let data = state
			.secrets
			.get(name)
			.ok_or_else(|| K8sError::SecretNotFound { name: name.into() })?;
		data
			.get(key)
			.map(|bytes| SecretBytes::new(bytes.clone()))
			.ok_or_else(|| K8sError::FieldMissing {
				name: name.into(),
				field: key.into(),
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn create_then_read_record() {
		let store = MemoryStore::new();
		let fields = BTreeMap::from([("wifi_interface".to_string(), "wlan0".to_string())]);

		assert!(!store.record_exists("a").await.unwrap());
		store.create_record("a", fields).await.unwrap();
		assert!(store.record_exists("a").await.unwrap());
		assert_eq!(
			store.read_record_field("a", "wifi_interface").await.unwrap(),
			"wlan0"
		);
		assert_eq!(store.record_create_calls(), 1);
	}

	#[tokio::test]
	async fn create_never_overwrites() {
		let store = MemoryStore::new();
		store.insert_record(
			"a",
			BTreeMap::from([("k".to_string(), "original".to_string())]),
		);

		let err = store
			.create_record("a", BTreeMap::from([("k".to_string(), "new".to_string())]))
			.await
			.unwrap_err();

		assert!(matches!(err, K8sError::AlreadyExists { .. }));
		assert_eq!(store.record("a").unwrap()["k"], "original");
	}

	#[tokio::test]
	async fn injected_failure_applies_to_named_object_only() {
		let store = MemoryStore::new();
		store.fail_object("broken");

		assert!(store.secret_exists("broken").await.is_err());
		assert!(!store.secret_exists("fine").await.unwrap());
	}

	#[tokio::test]
	async fn clones_share_state() {
		let store = MemoryStore::new();
		let handle = store.clone();

		store.create_secret("s", "ca.pem", b"bytes").await.unwrap();

		assert_eq!(handle.secret("s", "ca.pem"), Some(b"bytes".to_vec()));
		assert_eq!(handle.secret_create_calls(), 1);
	}
}
