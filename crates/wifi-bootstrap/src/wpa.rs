// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Rendering of wpa_supplicant configuration files.
//!
//! Values are never spliced into the output verbatim: SSIDs that cannot be
//! written as a plain quoted string fall back to the hex form, and
//! passphrases that the daemon's parser cannot read back are rejected.

use std::fmt::Write as _;

use thiserror::Error;
use wifi_bootstrap_secret::SecretString;

/// Placeholder stored when no credentials are known at first boot.
pub const BLANK_TEMPLATE: &str = "# See: https://linux.die.net/man/5/wpa_supplicant.conf";

/// Control socket directory written into every rendered configuration.
pub const DEFAULT_CTRL_INTERFACE: &str = "/var/run/wpa_supplicant";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WpaConfigError {
	#[error("ssid is empty")]
	EmptySsid,

	#[error("passphrase is empty")]
	EmptyPassphrase,

	#[error("passphrase contains characters wpa_supplicant cannot parse")]
	UnrepresentablePassphrase,
}

/// One `network={...}` block using WPA-PSK.
#[derive(Debug, Clone)]
pub struct Network {
	ssid: String,
	psk: SecretString,
}

impl Network {
	pub fn new(ssid: impl Into<String>, psk: SecretString) -> Result<Self, WpaConfigError> {
		let ssid = ssid.into();
		if ssid.is_empty() {
			return Err(WpaConfigError::EmptySsid);
		}
		if psk.is_empty() {
			return Err(WpaConfigError::EmptyPassphrase);
		}
		if !is_raw_psk(psk.expose()) && !psk.expose().bytes().all(is_printable) {
			return Err(WpaConfigError::UnrepresentablePassphrase);
		}
		Ok(Self { ssid, psk })
	}

	pub fn ssid(&self) -> &str {
		&self.ssid
	}

	fn render_into(&self, out: &mut String) {
		out.push_str("network={\n");
		let _ = writeln!(out, "\tssid={}", render_ssid(&self.ssid));
		let _ = writeln!(out, "\tpsk={}", render_psk(self.psk.expose()));
		out.push_str("}\n");
	}
}

/// A complete wpa_supplicant configuration.
#[derive(Debug, Clone)]
pub struct WpaConfig {
	ctrl_interface: String,
	networks: Vec<Network>,
}

impl WpaConfig {
	pub fn new() -> Self {
		Self {
			ctrl_interface: DEFAULT_CTRL_INTERFACE.to_string(),
			networks: Vec::new(),
		}
	}

	pub fn with_network(mut self, network: Network) -> Self {
		self.networks.push(network);
		self
	}

	pub fn render(&self) -> String {
		let mut out = String::new();
		let _ = writeln!(out, "ctrl_interface={}", self.ctrl_interface);
		for network in &self.networks {
			network.render_into(&mut out);
		}
		out
	}
}

impl Default for WpaConfig {
	fn default() -> Self {
		Self::new()
	}
}

fn is_printable(b: u8) -> bool {
	(0x20..=0x7e).contains(&b)
}

/// A 64 digit hex string is a pre-computed PSK and is written unquoted.
fn is_raw_psk(value: &str) -> bool {
	value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

fn render_ssid(ssid: &str) -> String {
	if ssid.bytes().all(|b| is_printable(b) && b != b'"') {
		format!("\"{ssid}\"")
	} else {
		hex::encode(ssid.as_bytes())
	}
}

// The daemon ends a quoted passphrase at the last quote on the line, so
// embedded quotes are preserved.
fn render_psk(psk: &str) -> String {
	if is_raw_psk(psk) {
		psk.to_string()
	} else {
		format!("\"{psk}\"")
	}
}
