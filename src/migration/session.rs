// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use crate::constants::{crd::SETTLE_DELAY_SECS, DEFAULT_TIMEOUT_SECS};
use crate::error::{ConvertError, Result};
use crate::migration::{NamespacePlan, StagingArea};
use crate::types::{ClusterEndpoint, ResourceKind};

/// Behavioural switches for one migration
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Check and plan everything, write nothing
    pub dry_run: bool,
    pub include_custom_resources: bool,
    /// Volume data is moved by external tooling; claims are imported
    pub transfer_storage: bool,
    /// Claims are imported without data so fresh volumes get provisioned
    pub recreate_pvcs: bool,
    /// Bound for every control-plane call
    pub timeout: Duration,
    /// Pause between applying CRDs and their instances
    pub crd_settle_delay: Duration,
    pub keep_staging: bool,
}

impl SessionOptions {
    /// Whether persistent volume claims take part in import and verification
    pub fn storage_enabled(&self) -> bool {
        self.transfer_storage || self.recreate_pvcs
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            include_custom_resources: false,
            transfer_storage: false,
            recreate_pvcs: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            crd_settle_delay: Duration::from_secs(SETTLE_DELAY_SECS),
            keep_staging: false,
        }
    }
}

/// Everything one migration run works with. Owns the staging area.
#[derive(Debug)]
pub struct MigrationSession {
    pub source: Option<ClusterEndpoint>,
    pub target: Option<ClusterEndpoint>,
    pub plan: NamespacePlan,
    pub kinds: Vec<ResourceKind>,
    pub staging: StagingArea,
    pub options: SessionOptions,
}

impl MigrationSession {
    pub fn source(&self) -> Result<&ClusterEndpoint> {
        self.source
            .as_ref()
            .ok_or_else(|| ConvertError::Config("no source cluster configured".to_string()))
    }

    pub fn target(&self) -> Result<&ClusterEndpoint> {
        self.target
            .as_ref()
            .ok_or_else(|| ConvertError::Config("no target cluster configured".to_string()))
    }

    /// Whether a kind is skipped because storage handling was not requested
    pub fn skips_kind(&self, kind: &ResourceKind) -> bool {
        kind.is_storage() && !self.options.storage_enabled()
    }
}
