// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Names of the cluster objects owned by one host.

/// ConfigMap key holding the wpa_supplicant configuration blob.
pub const DAEMON_CONFIG_FIELD: &str = "wpa_supplicant.conf";

/// ConfigMap key holding the wireless interface name.
pub const INTERFACE_FIELD: &str = "wifi_interface";

/// The certificate material a host may carry for EAP-TLS networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertKind {
	CaCert,
	ClientCert,
	ClientKey,
}

impl CertKind {
	pub const ALL: [CertKind; 3] = [CertKind::CaCert, CertKind::ClientCert, CertKind::ClientKey];

	/// Suffix of the secret name, `<host>-wifi-<suffix>`.
	pub fn suffix(&self) -> &'static str {
		match self {
			CertKind::CaCert => "ca-cert",
			CertKind::ClientCert => "client-cert",
			CertKind::ClientKey => "client-key",
		}
	}

	/// File name inside the certificate directory, also used as the secret's
	/// data key.
	pub fn file_name(&self) -> &'static str {
		match self {
			CertKind::CaCert => "ca.pem",
			CertKind::ClientCert => "user.pem",
			CertKind::ClientKey => "user.prv",
		}
	}
}

/// Derives record and secret names from the host identity.
///
/// The identity is not validated; an empty host yields names such as
/// `-wifi-config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordNames {
	host: String,
}

impl RecordNames {
	pub fn new(host: impl Into<String>) -> Self {
		Self { host: host.into() }
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	pub fn config_record(&self) -> String {
		format!("{}-wifi-config", self.host)
	}

	pub fn secret(&self, kind: CertKind) -> String {
		format!("{}-wifi-{}", self.host, kind.suffix())
	}
}
