// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;

pub use k8s_openapi::api::core::v1::{ConfigMap, Secret};

/// Label applied to every object this crate creates.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY_VALUE: &str = "wifi-bootstrap";

fn metadata(name: &str) -> ObjectMeta {
	ObjectMeta {
		name: Some(name.to_string()),
		labels: Some(BTreeMap::from([(
			MANAGED_BY_LABEL.to_string(),
			MANAGED_BY_VALUE.to_string(),
		)])),
		..Default::default()
	}
}

/// Build the ConfigMap manifest for a new record.
pub fn config_map_manifest(name: &str, fields: BTreeMap<String, String>) -> ConfigMap {
	ConfigMap {
		metadata: metadata(name),
		data: Some(fields),
		..Default::default()
	}
}

/// Build an Opaque Secret manifest holding a single data key.
pub fn secret_manifest(name: &str, key: &str, content: &[u8]) -> Secret {
	Secret {
		metadata: metadata(name),
		type_: Some("Opaque".to_string()),
		data: Some(BTreeMap::from([(
			key.to_string(),
			ByteString(content.to_vec()),
		)])),
		..Default::default()
	}
}
