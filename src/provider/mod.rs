// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Provider command-line tooling, used only to create a target cluster on request

pub mod runner;
pub mod shell;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Provider;

pub use runner::{CommandOutput, CommandRunner, TokioCommandRunner};
pub use shell::ShellProviderCli;

/// A cluster to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSpec {
    pub provider: Provider,
    pub name: String,
    pub node_count: u32,
    /// Kubernetes version, provider default when `None`
    pub version: Option<String>,
    /// Required by AKS only
    pub resource_group: Option<String>,
}

#[async_trait]
pub trait ProviderCli: Send + Sync {
    /// Fail with `MissingTool` when the provider's CLI is not on PATH
    async fn check_installed(&self, provider: Provider) -> Result<()>;

    async fn create_cluster(&self, spec: &ClusterSpec) -> Result<()>;
}
