// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! WiFi credentials passed on the kernel command line.

use std::path::Path;

use tracing::{debug, warn};
use wifi_bootstrap_secret::SecretString;

pub const SSID_PREFIX: &str = "--wifi-ssid=";
pub const PASSWORD_PREFIX: &str = "--wifi-password=";

/// Optional credentials read once at startup.
#[derive(Debug, Clone, Default)]
pub struct BootParams {
	pub ssid: Option<String>,
	pub password: Option<SecretString>,
}

impl BootParams {
	/// Extracts the recognized tokens from whitespace-separated text.
	///
	/// Everything after the first `=` is the value, so values may contain
	/// `=` themselves. A repeated key takes the last occurrence and an empty
	/// value counts as absent.
	pub fn parse(cmdline: &str) -> Self {
		let mut params = Self::default();
		for token in cmdline.split_whitespace() {
			if let Some(value) = token.strip_prefix(SSID_PREFIX) {
				params.ssid = (!value.is_empty()).then(|| value.to_string());
			} else if let Some(value) = token.strip_prefix(PASSWORD_PREFIX) {
				params.password = (!value.is_empty()).then(|| SecretString::new(value.to_string()));
			}
		}
		params
	}

	/// Reads and parses the boot parameter source. Never fails: an unreadable
	/// source yields no credentials.
	pub async fn read(path: &Path) -> Self {
		match tokio::fs::read_to_string(path).await {
			Ok(cmdline) => {
				let params = Self::parse(&cmdline);
				debug!(
					path = %path.display(),
					has_ssid = params.ssid.is_some(),
					has_password = params.password.is_some(),
					"read boot parameters"
				);
				params
			}
			Err(e) => {
				warn!(path = %path.display(), error = %e, "failed to read boot parameters");
				Self::default()
			}
		}
	}

	/// Both values, only when both are present.
	pub fn credentials(&self) -> Option<(&str, &SecretString)> {
		match (&self.ssid, &self.password) {
			(Some(ssid), Some(password)) => Some((ssid.as_str(), password)),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn extracts_both_values() {
		let params = BootParams::parse(
			"console=ttyS0 root=/dev/mmcblk0p2 --wifi-ssid=Home --wifi-password=secret quiet",
		);
		let (ssid, password) = params.credentials().unwrap();
		assert_eq!(ssid, "Home");
		assert_eq!(password.expose(), "secret");
	}

	#[test]
	fn value_keeps_embedded_equals() {
		let params = BootParams::parse("--wifi-password=a=b==");
		assert_eq!(params.password.unwrap().expose(), "a=b==");
	}

	#[test]
	fn empty_value_is_absent() {
		let params = BootParams::parse("--wifi-ssid= --wifi-password=secret");
		assert!(params.ssid.is_none());
		assert!(params.credentials().is_none());
	}

	#[test]
	fn partial_credentials_are_not_credentials() {
		let params = BootParams::parse("--wifi-ssid=Home");
		assert_eq!(params.ssid.as_deref(), Some("Home"));
		assert!(params.credentials().is_none());
	}

	#[test]
	fn last_occurrence_wins() {
		let params = BootParams::parse("--wifi-ssid=First --wifi-ssid=Second");
		assert_eq!(params.ssid.as_deref(), Some("Second"));
	}

	#[test]
	fn unrelated_tokens_are_ignored() {
		let params = BootParams::parse("wifi-ssid=Home --wifi-ssidx=Nope -wifi-password=x");
		assert!(params.ssid.is_none());
		assert!(params.password.is_none());
	}

	#[tokio::test]
	async fn unreadable_source_yields_nothing() {
		let params = BootParams::read(Path::new("/nonexistent/cmdline")).await;
		assert!(params.ssid.is_none());
		assert!(params.password.is_none());
	}

	#[tokio::test]
	async fn reads_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("cmdline");
		std::fs::write(&path, "ro --wifi-ssid=Lab --wifi-password=hunter22\n").unwrap();

		let params = BootParams::read(&path).await;
		assert_eq!(params.ssid.as_deref(), Some("Lab"));
		assert_eq!(params.password.unwrap().expose(), "hunter22");
	}

	proptest! {
		#[test]
		fn recognized_pair_is_extracted(
			ssid in "[A-Za-z0-9_.-]{1,32}",
			password in "[A-Za-z0-9!@#%=]{1,63}",
			noise in "[a-z]{1,8}=[a-z0-9]{0,8}",
		) {
			let cmdline = format!("{noise} --wifi-ssid={ssid} {noise} --wifi-password={password}");
			let params = BootParams::parse(&cmdline);
			let (got_ssid, got_password) = params.credentials().unwrap();
			prop_assert_eq!(got_ssid, ssid.as_str());
			prop_assert_eq!(got_password.expose(), &password);
		}
	}
}
