// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for store operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur while talking to the cluster store.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("ConfigMap not found: {name}")]
	ConfigMapNotFound { name: String },

	#[error("Secret not found: {name}")]
	SecretNotFound { name: String },

	#[error("{name} has no field {field}")]
	FieldMissing { name: String, field: String },

	#[error("field {field} of {name} is not valid: {message}")]
	InvalidField {
		name: String,
		field: String,
		message: String,
	},

	#[error("{name} already exists")]
	AlreadyExists { name: String },

	#[error("kubectl {args} failed: {stderr}")]
	CommandFailed { args: String, stderr: String },

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Operation timed out")]
	Timeout,
}

impl K8sError {
	/// Whether the error means the object is absent, as opposed to the store
	/// being unreachable.
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			K8sError::ConfigMapNotFound { .. } | K8sError::SecretNotFound { .. }
		)
	}
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}
