// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::constants::{DEFAULT_RESOURCES, DEFAULT_TIMEOUT_SECS};
use crate::error::{ConvertError, Result};
use crate::migration::{EndpointRequest, NamespaceSelection, SessionOptions};
use crate::provider::ClusterSpec;
use crate::types::kind::parse_kinds;
use crate::types::{Provider, ResourceKind};

/// Which part of the pipeline a command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Export, sanitize, import and verify
    Convert,
    /// Export and sanitize into a retained staging directory
    Export,
    /// Import an existing staging directory
    Import,
    /// Verify a target against an existing staging directory
    Verify,
}

impl Mode {
    pub fn needs_source(self) -> bool {
        matches!(self, Mode::Convert | Mode::Export)
    }

    pub fn needs_target(self) -> bool {
        !matches!(self, Mode::Export)
    }

    /// Whether the command changes the target cluster
    pub fn mutates_target(self) -> bool {
        matches!(self, Mode::Convert | Mode::Import)
    }
}

/// Flags shared by every migration command
#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Source cluster provider
    #[arg(long, value_enum)]
    pub source_provider: Option<Provider>,

    /// Source cluster name
    #[arg(long)]
    pub source_cluster: Option<String>,

    /// Use this kubeconfig context for the source verbatim
    #[arg(long)]
    pub source_context: Option<String>,

    /// Kubeconfig for the source (default: KUBECONFIG or ~/.kube/config)
    #[arg(long)]
    pub source_kubeconfig: Option<PathBuf>,

    /// Target cluster provider
    #[arg(long, value_enum)]
    pub target_provider: Option<Provider>,

    /// Target cluster name
    #[arg(long)]
    pub target_cluster: Option<String>,

    /// Use this kubeconfig context for the target verbatim
    #[arg(long)]
    pub target_context: Option<String>,

    /// Kubeconfig for the target (default: KUBECONFIG or ~/.kube/config)
    #[arg(long)]
    pub target_kubeconfig: Option<PathBuf>,

    /// Namespaces to migrate (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub namespaces: Vec<String>,

    /// Migrate every namespace except the excluded ones
    #[arg(long, conflicts_with = "namespaces")]
    pub all_namespaces: bool,

    /// Namespaces never migrated (replaces the system namespace defaults)
    #[arg(long, value_delimiter = ',')]
    pub exclude_namespaces: Option<Vec<String>>,

    /// Resource kinds to migrate (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub resources: Option<Vec<String>>,

    /// Also migrate CRDs and their namespaced instances
    #[arg(long)]
    pub include_custom_resources: bool,

    /// Import claims; volume data is copied by external tooling
    #[arg(long, conflicts_with = "recreate_pvcs")]
    pub transfer_storage: bool,

    /// Import claims without data so fresh volumes are provisioned
    #[arg(long)]
    pub recreate_pvcs: bool,

    /// Plan and check only, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub force: bool,

    /// Timeout in seconds for each cluster call
    #[arg(long, env = "CLUSTERCONVERT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Staging directory (default: a fresh directory under the system temp dir)
    #[arg(long, env = "CLUSTERCONVERT_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Keep the staging directory after a successful conversion
    #[arg(long)]
    pub keep_staging: bool,

    /// Create the target cluster with its provider CLI first
    #[arg(long)]
    pub create_target: bool,

    /// Node count for --create-target
    #[arg(long, default_value_t = 1)]
    pub target_node_count: u32,

    /// Kubernetes version for --create-target
    #[arg(long)]
    pub target_version: Option<String>,

    /// Resource group for --create-target on AKS
    #[arg(long)]
    pub target_resource_group: Option<String>,
}

/// Validated options for one run
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub mode: Mode,
    pub source: Option<EndpointRequest>,
    pub target: Option<EndpointRequest>,
    pub selection: NamespaceSelection,
    pub kinds: Vec<ResourceKind>,
    pub staging_dir: Option<PathBuf>,
    pub session: SessionOptions,
    pub force: bool,
    pub create_target: Option<ClusterSpec>,
}

fn endpoint(
    side: &str,
    provider: Option<Provider>,
    cluster: Option<String>,
    context: Option<String>,
    kubeconfig: Option<PathBuf>,
) -> Result<EndpointRequest> {
    let provider = provider.ok_or_else(|| {
        ConvertError::Config(format!("--{}-provider is required", side))
    })?;
    let cluster_name = cluster.or_else(|| context.clone()).ok_or_else(|| {
        ConvertError::Config(format!(
            "--{}-cluster or --{}-context is required",
            side, side
        ))
    })?;
    Ok(EndpointRequest {
        provider,
        cluster_name,
        context,
        kubeconfig,
    })
}

impl MigrateArgs {
    /// Validate the flags for a mode
    pub fn into_options(self, mode: Mode) -> Result<MigrationOptions> {
        if self.timeout == 0 {
            return Err(ConvertError::Config("--timeout must be at least 1 second".to_string()));
        }
        if !mode.needs_source() && self.staging_dir.is_none() {
            return Err(ConvertError::Config(
                "--staging-dir is required to import or verify an existing export".to_string(),
            ));
        }

        let source = if mode.needs_source() {
            Some(endpoint(
                "source",
                self.source_provider,
                self.source_cluster,
                self.source_context,
                self.source_kubeconfig,
            )?)
        } else {
            None
        };
        let target = if mode.needs_target() {
            Some(endpoint(
                "target",
                self.target_provider,
                self.target_cluster,
                self.target_context,
                self.target_kubeconfig,
            )?)
        } else {
            None
        };

        let create_target = match (&target, self.create_target) {
            (Some(target), true) if mode.mutates_target() => {
                if self.target_node_count == 0 {
                    return Err(ConvertError::Config(
                        "--target-node-count must be at least 1".to_string(),
                    ));
                }
                Some(ClusterSpec {
                    provider: target.provider,
                    name: target.cluster_name.clone(),
                    node_count: self.target_node_count,
                    version: self.target_version,
                    resource_group: self.target_resource_group,
                })
            }
            (_, true) => {
                return Err(ConvertError::Config(
                    "--create-target only applies to convert and import".to_string(),
                ))
            }
            _ => None,
        };

        let kinds = match &self.resources {
            Some(names) => parse_kinds(names.as_slice()),
            None => parse_kinds(DEFAULT_RESOURCES),
        }
        .map_err(ConvertError::Config)?;
        if kinds.is_empty() {
            return Err(ConvertError::Config("--resources selects no kinds".to_string()));
        }

        let mut selection = NamespaceSelection::new(self.namespaces, self.all_namespaces);
        if let Some(exclude) = self.exclude_namespaces {
            selection = selection.with_exclude(exclude);
        }

        let session = SessionOptions {
            dry_run: self.dry_run,
            include_custom_resources: self.include_custom_resources,
            transfer_storage: self.transfer_storage,
            recreate_pvcs: self.recreate_pvcs,
            timeout: Duration::from_secs(self.timeout),
            keep_staging: self.keep_staging,
            ..SessionOptions::default()
        };

        Ok(MigrationOptions {
            mode,
            source,
            target,
            selection,
            kinds,
            staging_dir: self.staging_dir,
            session,
            force: self.force,
            create_target,
        })
    }
}
