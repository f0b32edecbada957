// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubeconfig loading and per-context client creation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KConfig};
use tracing::{debug, instrument};

use crate::error::{ConvertError, Result};
use crate::kubernetes::{ControlPlane, KubeControlPlane};

/// Source of kubeconfig contexts and clients bound to them
#[async_trait]
pub trait Connector: Send + Sync {
    /// The kubeconfig file this connector reads, `None` for the default lookup
    fn kubeconfig_path(&self) -> Option<&Path>;

    /// All context names, in kubeconfig order
    async fn contexts(&self) -> Result<Vec<String>>;

    /// Build a control-plane client for an explicit context
    async fn connect(&self, context: &str) -> Result<Arc<dyn ControlPlane>>;
}

/// Reads the kubeconfig on every call so contexts added by a provider CLI
/// (e.g. after cluster creation) are picked up
pub struct KubeconfigConnector {
    path: Option<PathBuf>,
    timeout: Duration,
}

impl KubeconfigConnector {
    pub fn new(path: Option<PathBuf>, timeout: Duration) -> Self {
        Self { path, timeout }
    }

    fn load(&self) -> Result<Kubeconfig> {
        let loaded = match &self.path {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        };
        loaded.map_err(|e| {
            ConvertError::KubeconfigError(format!(
                "Failed to read kubeconfig {}: {}",
                self.describe_path(),
                e
            ))
        })
    }

    fn describe_path(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(default)".to_string())
    }
}

#[async_trait]
impl Connector for KubeconfigConnector {
    fn kubeconfig_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn contexts(&self) -> Result<Vec<String>> {
        Ok(self.load()?.contexts.into_iter().map(|c| c.name).collect())
    }

    #[instrument(skip(self))]
    async fn connect(&self, context: &str) -> Result<Arc<dyn ControlPlane>> {
        let kubeconfig = self.load()?;
        let options = KubeConfigOptions {
            context: Some(context.to_string()),
            ..Default::default()
        };

        let mut config = KConfig::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| {
                ConvertError::KubeconfigError(format!(
                    "Failed to create config for context {}: {}",
                    context, e
                ))
            })?;
        config.connect_timeout = Some(self.timeout);
        config.read_timeout = Some(self.timeout);
        debug!("Using cluster URL {} for context {}", config.cluster_url, context);

        let client = Client::try_from(config).map_err(|e| {
            ConvertError::KubeconfigError(format!("Failed to create client: {}", e))
        })?;
        Ok(Arc::new(KubeControlPlane::new(client, self.timeout)))
    }
}
