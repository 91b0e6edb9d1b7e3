// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Wireless interface discovery.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Interface used when discovery finds nothing.
pub const FALLBACK_INTERFACE: &str = "wlan0";

/// Marker iwconfig prints next to interfaces with wireless extensions.
pub const WIRELESS_MARKER: &str = "IEEE 802.11";

/// Returns the first token of the first line carrying the wireless marker.
pub fn parse_wireless_interface(listing: &str) -> Option<&str> {
	listing
		.lines()
		.filter(|line| line.contains(WIRELESS_MARKER))
		.find_map(|line| line.split_whitespace().next())
}

/// Runs the interface listing tool and picks a wireless interface from it.
#[derive(Debug, Clone)]
pub struct InterfaceResolver {
	command: Vec<String>,
	limit: Option<Duration>,
}

impl InterfaceResolver {
	pub fn new(command: Vec<String>, limit: Option<Duration>) -> Self {
		Self { command, limit }
	}

	/// Never fails: any problem with the listing tool yields
	/// [`FALLBACK_INTERFACE`], since the daemon reports an unusable interface
	/// on its own.
	pub async fn resolve(&self) -> String {
		match self.list().await {
			Some(listing) => match parse_wireless_interface(&listing) {
				Some(iface) => {
					info!(iface, "detected wireless interface");
					return iface.to_string();
				}
				None => warn!("no wireless interface in listing"),
			},
			None => debug!("interface listing unavailable"),
		}
		info!(iface = FALLBACK_INTERFACE, "defaulting wireless interface");
		FALLBACK_INTERFACE.to_string()
	}

	async fn list(&self) -> Option<String> {
		let (program, args) = self.command.split_first()?;
		let mut cmd = Command::new(program);
		cmd.args(args)
			.stdin(Stdio::null())
			.stderr(Stdio::null())
			.kill_on_drop(true);

		let output = match self.limit {
			Some(limit) => match timeout(limit, cmd.output()).await {
				Ok(result) => result,
				Err(_) => {
					warn!(program = %program, "interface listing timed out");
					return None;
				}
			},
			None => cmd.output().await,
		};

		match output {
			Ok(output) if output.status.success() => {
				Some(String::from_utf8_lossy(&output.stdout).into_owned())
			}
			Ok(output) => {
				warn!(program = %program, status = %output.status, "interface listing failed");
				None
			}
			Err(e) => {
				warn!(program = %program, error = %e, "failed to run interface listing");
				None
			}
		}
	}
}
