// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::process::Stdio;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace, warn};
use wifi_bootstrap_secret::SecretBytes;

use crate::client::{RecordStore, SecretStore};
use crate::error::K8sError;
use crate::types::{config_map_manifest, secret_manifest, ConfigMap, Secret};

/// Store implementation that drives the kubectl CLI.
///
/// The command may carry leading words, e.g. `["k3s", "kubectl"]`.
#[derive(Debug, Clone)]
pub struct KubectlClient {
	command: Vec<String>,
	namespace: Option<String>,
}

/// Captured result of one kubectl invocation.
struct KubectlOutput {
	success: bool,
	stdout: Vec<u8>,
	stderr: String,
}

impl KubectlClient {
	pub fn new(command: Vec<String>, namespace: Option<String>) -> Self {
		Self { command, namespace }
	}

	/// Runs kubectl with the given arguments, optionally feeding stdin.
	async fn run(&self, args: &[&str], stdin: Option<Vec<u8>>) -> Result<KubectlOutput, K8sError> {
		let (program, leading) = self.command.split_first().ok_or_else(|| K8sError::CommandFailed {
			args: args.join(" "),
			stderr: "empty kubectl command".to_string(),
		})?;

		let mut cmd = Command::new(program);
		cmd.args(leading);
		if let Some(ns) = &self.namespace {
			cmd.arg("--namespace").arg(ns);
		}
		cmd.args(args)
			.stdin(if stdin.is_some() {
				Stdio::piped()
			} else {
				Stdio::null()
			})
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);

		trace!(
			cmd = %format!("{} {}", self.command.join(" "), args.join(" ")),
			"running kubectl command"
		);

		let mut child = cmd.spawn().map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				warn!(program = %program, "kubectl not found in PATH");
			}
			K8sError::Io(e)
		})?;

		if let Some(input) = stdin {
			if let Some(mut pipe) = child.stdin.take() {
				pipe.write_all(&input).await?;
				pipe.shutdown().await?;
			}
		}

		let output = child.wait_with_output().await?;
		Ok(KubectlOutput {
			success: output.status.success(),
			stdout: output.stdout,
			stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
		})
	}

	/// Fetches an object as JSON. `Ok(None)` when the server reports NotFound.
	async fn get_object<T: DeserializeOwned>(
		&self,
		kind: &str,
		name: &str,
	) -> Result<Option<T>, K8sError> {
		let args = ["get", kind, name, "-o", "json"];
		let output = self.run(&args, None).await?;

		if output.success {
			return Ok(Some(serde_json::from_slice(&output.stdout)?));
		}
		if output.stderr.contains("NotFound") {
			debug!(kind, name, "kubectl reports object not found");
			return Ok(None);
		}
		Err(K8sError::CommandFailed {
			args: args.join(" "),
			stderr: output.stderr,
		})
	}

	async fn create_object<T: Serialize>(&self, name: &str, manifest: &T) -> Result<(), K8sError> {
		let body = serde_json::to_vec(manifest)?;
		let args = ["create", "-f", "-"];
		let output = self.run(&args, Some(body)).await?;

		if output.success {
			debug!(name, "kubectl created object");
			return Ok(());
		}
		if output.stderr.contains("AlreadyExists") {
			return Err(K8sError::AlreadyExists { name: name.into() });
		}
		Err(K8sError::CommandFailed {
			args: args.join(" "),
			stderr: output.stderr,
		})
	}
}

impl Default for KubectlClient {
	fn default() -> Self {
		Self::new(vec!["kubectl".to_string()], None)
	}
}

#[async_trait]
impl RecordStore for KubectlClient {
	async fn record_exists(&self, name: &str) -> Result<bool, K8sError> {
		Ok(self.get_object::<ConfigMap>("configmap", name).await?.is_some())
	}

	async fn create_record(
		&self,
		name: &str,
		fields: BTreeMap<String, String>,
	) -> Result<(), K8sError> {
		self
			.create_object(name, &config_map_manifest(name, fields))
			.await
	}

	async fn read_record_field(&self, name: &str, field: &str) -> Result<String, K8sError> {
		let cm: ConfigMap = self
			.get_object("configmap", name)
			.await?
			.ok_or_else(|| K8sError::ConfigMapNotFound { name: name.into() })?;

		cm.data
			.and_then(|mut data| data.remove(field))
			.ok_or_else(|| K8sError::FieldMissing {
				name: name.into(),
				field: field.into(),
			})
	}
}

#[async_trait]
impl SecretStore for KubectlClient {
	async fn secret_exists(&self, name: &str) -> Result<bool, K8sError> {
		Ok(self.get_object::<Secret>("secret", name).await?.is_some())
	}

	async fn create_secret(&self, name: &str, key: &str, content: &[u8]) -> Result<(), K8sError> {
		self
			.create_object(name, &secret_manifest(name, key, content))
			.await
	}

	async fn read_secret_field(&self, name: &str, key: &str) -> Result<SecretBytes, K8sError> {
		let secret: Secret = self
			.get_object("secret", name)
			.await?
			.ok_or_else(|| K8sError::SecretNotFound { name: name.into() })?;

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

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::Path;
	use tempfile::TempDir;

	const FAKE_KUBECTL: &str = r#"
log="$(dirname "$0")/calls.log"
echo "$*" >> "$log"
case "$*" in
  "get configmap present -o json")
    echo '{"apiVersion":"v1","kind":"ConfigMap","metadata":{"name":"present"},"data":{"wifi_interface":"wlan1"}}'
    ;;
  "get configmap"*)
    echo 'Error from server (NotFound): configmaps "missing" not found' >&2
    exit 1
    ;;
  "get secret cert -o json")
    echo '{"apiVersion":"v1","kind":"Secret","metadata":{"name":"cert"},"data":{"ca.pem":"aGVsbG8="}}'
    ;;
  "get secret"*)
    echo 'Error from server (NotFound): secrets "missing" not found' >&2
    exit 1
    ;;
  "create -f -")
    body="$(cat)"
    case "$body" in
      *'"name":"taken"'*)
        echo 'Error from server (AlreadyExists): configmaps "taken" already exists' >&2
        exit 1
        ;;
    esac
    printf '%s' "$body" > "$(dirname "$0")/created.json"
    ;;
  *)
    echo "unable to connect to the server" >&2
    exit 1
    ;;
esac
"#;

	fn fake_kubectl(dir: &Path) -> KubectlClient {
		let script = dir.join("kubectl.sh");
		std::fs::write(&script, FAKE_KUBECTL).unwrap();
		KubectlClient::new(
			vec!["sh".to_string(), script.display().to_string()],
			None,
		)
	}

	#[tokio::test]
	async fn record_exists_distinguishes_present_and_missing() {
		let temp = TempDir::new().unwrap();
		let client = fake_kubectl(temp.path());

		assert!(client.record_exists("present").await.unwrap());
		assert!(!client.record_exists("missing").await.unwrap());
	}

	#[tokio::test]
	async fn read_record_field_returns_value() {
		let temp = TempDir::new().unwrap();
		let client = fake_kubectl(temp.path());

		let iface = client
			.read_record_field("present", "wifi_interface")
			.await
			.unwrap();
		assert_eq!(iface, "wlan1");
	}

	#[tokio::test]
	async fn read_record_field_reports_missing_field() {
		let temp = TempDir::new().unwrap();
		let client = fake_kubectl(temp.path());

		let err = client
			.read_record_field("present", "wpa_supplicant.conf")
			.await
			.unwrap_err();
		assert!(matches!(err, K8sError::FieldMissing { .. }));
	}

	#[tokio::test]
	async fn read_record_field_reports_missing_record() {
		let temp = TempDir::new().unwrap();
		let client = fake_kubectl(temp.path());

		let err = client
			.read_record_field("missing", "wifi_interface")
			.await
			.unwrap_err();
		assert!(err.is_not_found());
	}

	#[tokio::test]
	async fn secret_data_is_base64_decoded() {
		let temp = TempDir::new().unwrap();
		let client = fake_kubectl(temp.path());

		assert!(client.secret_exists("cert").await.unwrap());
		assert!(!client.secret_exists("missing").await.unwrap());

		let bytes = client.read_secret_field("cert", "ca.pem").await.unwrap();
		assert_eq!(bytes.expose().as_slice(), b"hello");
	}

	#[tokio::test]
	async fn create_secret_pipes_manifest_on_stdin() {
		let temp = TempDir::new().unwrap();
		let client = fake_kubectl(temp.path());

		client
			.create_secret("node-wifi-ca-cert", "ca.pem", b"hello")
			.await
			.unwrap();

		let created = std::fs::read(temp.path().join("created.json")).unwrap();
		let secret: Secret = serde_json::from_slice(&created).unwrap();
		assert_eq!(secret.metadata.name.as_deref(), Some("node-wifi-ca-cert"));
		assert_eq!(
			secret.data.unwrap().get("ca.pem").map(|b| b.0.clone()),
			Some(b"hello".to_vec())
		);
	}

	#[tokio::test]
	async fn create_record_maps_already_exists() {
		let temp = TempDir::new().unwrap();
		let client = fake_kubectl(temp.path());

		let err = client
			.create_record("taken", BTreeMap::new())
			.await
			.unwrap_err();
		assert!(matches!(err, K8sError::AlreadyExists { name } if name == "taken"));
	}

	#[tokio::test]
	async fn transport_failure_is_an_error_not_absence() {
		let temp = TempDir::new().unwrap();
		let client = KubectlClient::new(
			vec![
				"sh".to_string(),
				temp.path().join("kubectl.sh").display().to_string(),
			],
			Some("edge".to_string()),
		);
		std::fs::write(temp.path().join("kubectl.sh"), FAKE_KUBECTL).unwrap();

		// The namespace flag shifts the arguments, so nothing in the fake matches.
		let err = client.record_exists("present").await.unwrap_err();
		assert!(matches!(err, K8sError::CommandFailed { .. }));

		let calls = std::fs::read_to_string(temp.path().join("calls.log")).unwrap();
		assert!(calls.starts_with("--namespace edge get configmap present"));
	}

	#[tokio::test]
	async fn missing_program_is_io_error() {
		let client = KubectlClient::new(vec!["definitely-not-kubectl-xyz".to_string()], None);
		let err = client.record_exists("anything").await.unwrap_err();
		assert!(matches!(err, K8sError::Io(_)));
	}
}
