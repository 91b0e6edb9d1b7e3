// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use async_trait::async_trait;
use kube::{
	api::{Api, PostParams},
	Client,
};
use tracing::{debug, instrument};
use wifi_bootstrap_secret::SecretBytes;

use crate::client::{RecordStore, SecretStore};
use crate::error::K8sError;
use crate::types::{config_map_manifest, secret_manifest, ConfigMap, Secret};

/// Production store implementation using the kube crate.
pub struct KubeClient {
	client: Client,
	namespace: Option<String>,
}

impl KubeClient {
	/// Create a new KubeClient that auto-discovers cluster configuration.
	///
	/// This will attempt to load config from:
	/// 1. In-cluster service account (when running in K8s)
	/// 2. KUBECONFIG environment variable
	/// 3. ~/.kube/config
	///
	/// Without an explicit namespace the client's default namespace is used.
	pub async fn new(namespace: Option<String>) -> Result<Self, K8sError> {
		let client = Client::try_default().await?;
		debug!(namespace = ?namespace, "K8s client initialized");
		Ok(Self { client, namespace })
	}

	fn config_maps(&self) -> Api<ConfigMap> {
		match &self.namespace {
			Some(ns) => Api::namespaced(self.client.clone(), ns),
			None => Api::default_namespaced(self.client.clone()),
		}
	}

	fn secrets(&self) -> Api<Secret> {
		match &self.namespace {
			Some(ns) => Api::namespaced(self.client.clone(), ns),
			None => Api::default_namespaced(self.client.clone()),
		}
	}
}

#[async_trait]
impl RecordStore for KubeClient {
	#[instrument(skip(self))]
	async fn record_exists(&self, name: &str) -> Result<bool, K8sError> {
		Ok(self.config_maps().get_opt(name).await?.is_some())
	}

	#[instrument(skip(self, fields))]
	async fn create_record(
		&self,
		name: &str,
		fields: BTreeMap<String, String>,
	) -> Result<(), K8sError> {
		let cm = config_map_manifest(name, fields);
		match self.config_maps().create(&PostParams::default(), &cm).await {
			Ok(_) => Ok(()),
			Err(kube::Error::Api(err)) if err.code == 409 => {
				Err(K8sError::AlreadyExists { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self))]
	async fn read_record_field(&self, name: &str, field: &str) -> Result<String, K8sError> {
		let cm = match self.config_maps().get(name).await {
			Ok(cm) => cm,
			Err(kube::Error::Api(err)) if err.code == 404 => {
				return Err(K8sError::ConfigMapNotFound { name: name.into() })
			}
			Err(e) => return Err(e.into()),
		};

		cm.data
			.and_then(|mut data| data.remove(field))
			.ok_or_else(|| K8sError::FieldMissing {
				name: name.into(),
				field: field.into(),
			})
	}
}

#[async_trait]
impl SecretStore for KubeClient {
	#[instrument(skip(self))]
	async fn secret_exists(&self, name: &str) -> Result<bool, K8sError> {
		Ok(self.secrets().get_opt(name).await?.is_some())
	}

	#[instrument(skip(self, content), fields(bytes = content.len()))]
	async fn create_secret(&self, name: &str, key: &str, content: &[u8]) -> Result<(), K8sError> {
		let secret = secret_manifest(name, key, content);
		match self.secrets().create(&PostParams::default(), &secret).await {
			Ok(_) => Ok(()),
			Err(kube::Error::Api(err)) if err.code == 409 => {
				Err(K8sError::AlreadyExists { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self))]
	async fn read_secret_field(&self, name: &str, key: &str) -> Result<SecretBytes, K8sError> {
		let secret = match self.secrets().get(name).await {
			Ok(secret) => secret,
			Err(kube::Error::Api(err)) if err.code == 404 => {
				return Err(K8sError::SecretNotFound { name: name.into() })
			}
			Err(e) => return Err(e.into()),
		};

		secret
			.data
			.and_then(|mut data| data.remove(key))
			.map(|bytes| SecretBytes::new(bytes.0))
			.ok_or_else(|| K8sError::FieldMissing {
				name: name.into(),
				field: key.into(),
			})
	}
}
