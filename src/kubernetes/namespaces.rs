// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use serde_json::json;
use tracing::{debug, info, instrument};

use crate::error::{ConvertError, Result};
use crate::kubernetes::ControlPlane;
use crate::types::kind::namespace_resource;
use crate::types::ResourceDocument;

/// Ensure a namespace exists in the cluster, create if it doesn't
#[instrument(skip(client))]
pub async fn ensure_namespace_exists(client: &dyn ControlPlane, namespace: &str) -> Result<()> {
    let resource = namespace_resource();

    match client.get(&resource, None, namespace).await {
        Ok(Some(_)) => {
            debug!("Namespace {} already exists", namespace);
            Ok(())
        }
        Ok(None) => {
            info!("Creating namespace {}", namespace);
            let ns = ResourceDocument::new(json!({
                "apiVersion": "v1",
                "kind": "Namespace",
                "metadata": {"name": namespace}
            }));
            client.create(&resource, &ns).await.map_err(|e| {
                ConvertError::NamespaceError(format!(
                    "Failed to create namespace {}: {}",
                    namespace, e
                ))
            })?;
            info!("Namespace {} created successfully", namespace);
            Ok(())
        }
        Err(e) => Err(ConvertError::NamespaceError(format!(
            "Failed to check/create namespace {}: {}",
            namespace, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeCluster;

    #[tokio::test]
    async fn test_creates_missing_namespace() {
        let cluster = FakeCluster::new();
        ensure_namespace_exists(&cluster, "app").await.unwrap();
        assert_eq!(cluster.namespaces(), vec!["app"]);
        assert_eq!(cluster.mutations(), vec!["create namespaces/app"]);
    }

    #[tokio::test]
    async fn test_existing_namespace_is_untouched() {
        let cluster = FakeCluster::new().with_namespace("app");
        ensure_namespace_exists(&cluster, "app").await.unwrap();
        assert!(cluster.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_is_namespace_error() {
        let cluster = FakeCluster::new().reject_namespace("app");
        let err = ensure_namespace_exists(&cluster, "app").await.unwrap_err();
        assert!(matches!(err, ConvertError::NamespaceError(_)));
    }
}
