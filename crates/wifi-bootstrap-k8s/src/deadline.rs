// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::warn;
use wifi_bootstrap_secret::SecretBytes;

use crate::client::{RecordStore, SecretStore};
use crate::error::K8sError;

/// Bounds every call on the wrapped store by a per-call deadline.
///
/// A call that does not finish in time is dropped (for kubectl that kills the
/// child process) and reported as [`K8sError::Timeout`]. `None` disables the
/// bound.
#[derive(Debug, Clone)]
pub struct DeadlineStore<S> {
	inner: S,
	limit: Option<Duration>,
}

impl<S> DeadlineStore<S> {
	pub fn new(inner: S, limit: Option<Duration>) -> Self {
		Self { inner, limit }
	}

	pub fn inner(&self) -> &S {
		&self.inner
	}

	async fn bounded<T, F>(&self, op: &'static str, name: &str, fut: F) -> Result<T, K8sError>
	where
		F: Future<Output = Result<T, K8sError>> + Send,
	{
		let Some(limit) = self.limit else {
			return fut.await;
		};
		match timeout(limit, fut).await {
			Ok(result) => result,
			Err(_) => {
				warn!(op, name, timeout_secs = limit.as_secs_f64(), "store call timed out");
				Err(K8sError::Timeout)
			}
		}
	}
}

#[async_trait]
impl<S: RecordStore> RecordStore for DeadlineStore<S> {
	async fn record_exists(&self, name: &str) -> Result<bool, K8sError> {
		self
			.bounded("record_exists", name, self.inner.record_exists(name))
			.await
	}

	async fn create_record(
		&self,
		name: &str,
		fields: BTreeMap<String, String>,
	) -> Result<(), K8sError> {
		self
			.bounded("create_record", name, self.inner.create_record(name, fields))
			.await
	}

	async fn read_record_field(&self, name: &str, field: &str) -> Result<String, K8sError> {
		self
			.bounded(
				"read_record_field",
				name,
				self.inner.read_record_field(name, field),
			)
			.await
	}
}

#[async_trait]
impl<S: SecretStore> SecretStore for DeadlineStore<S> {
	async fn secret_exists(&self, name: &str) -> Result<bool, K8sError> {
		self
			.bounded("secret_exists", name, self.inner.secret_exists(name))
			.await
	}

	async fn create_secret(&self, name: &str, key: &str, content: &[u8]) -> Result<(), K8sError> {
		self
			.bounded(
				"create_secret",
				name,
				self.inner.create_secret(name, key, content),
			)
			.await
	}

	async fn read_secret_field(&self, name: &str, key: &str) -> Result<SecretBytes, K8sError> {
		self
			.bounded(
				"read_secret_field",
				name,
				self.inner.read_secret_field(name, key),
			)
			.await
	}
}
