// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wifi_bootstrap::{Args, Bootstrap, BootstrapConfig, StoreBackend};
use wifi_bootstrap_k8s::{DeadlineStore, KubeClient, KubectlClient, RecordStore, SecretStore};

fn init_logging(json: bool) {
	let json_layer = json.then(|| {
		tracing_subscriber::fmt::layer()
			.json()
			.with_writer(std::io::stderr)
	});
	let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(json_layer)
		.with(text_layer)
		.init();
}

async fn run<S>(store: S, config: BootstrapConfig) -> Result<()>
where
	S: RecordStore + SecretStore,
{
	let bootstrap = Bootstrap::new(store, config);
	let report = bootstrap.run().await.context("wifi bootstrap failed")?;

	if report.success() {
		info!(status = %report.status, "wpa_supplicant exited");
	} else {
		error!(status = %report.status, "wpa_supplicant exited with failure");
	}
	Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	init_logging(args.log_json);

	info!(
		host = %args.host,
		store = ?args.store,
		namespace = ?args.namespace,
		"starting wifi-bootstrap"
	);
	if args.host.is_empty() {
		warn!("host identity is empty, records will be named with a leading dash");
	}

	let config = args.to_config();
	let limit = args.call_timeout();
	match args.store {
		StoreBackend::Kube => {
			let client = KubeClient::new(args.namespace.clone())
				.await
				.context("failed to create kubernetes client")?;
			run(DeadlineStore::new(client, limit), config).await
		}
		StoreBackend::Kubectl => {
			let client = KubectlClient::new(args.kubectl_command(), args.namespace.clone());
			run(DeadlineStore::new(client, limit), config).await
		}
	}
}
