// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::kubernetes::ControlPlane;
use crate::types::provider::Provider;

/// Which kubeconfig file and context authenticate an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// `None` means the default kubeconfig lookup (`KUBECONFIG` or `~/.kube/config`)
    pub kubeconfig: Option<PathBuf>,
    pub context: String,
}

/// A resolved, reachable cluster control plane.
///
/// Each endpoint owns a client bound to its own context, so source and target
/// calls never share mutable client state.
#[derive(Clone)]
pub struct ClusterEndpoint {
    pub provider: Provider,
    pub cluster_name: String,
    pub context: String,
    pub credential: Credential,
    client: Arc<dyn ControlPlane>,
}

impl ClusterEndpoint {
    pub fn new(
        provider: Provider,
        cluster_name: impl Into<String>,
        credential: Credential,
        client: Arc<dyn ControlPlane>,
    ) -> Self {
        Self {
            provider,
            cluster_name: cluster_name.into(),
            context: credential.context.clone(),
            credential,
            client,
        }
    }

    pub fn client(&self) -> &dyn ControlPlane {
        self.client.as_ref()
    }
}

impl fmt::Debug for ClusterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterEndpoint")
            .field("provider", &self.provider)
            .field("cluster_name", &self.cluster_name)
            .field("context", &self.context)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ClusterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} (context {})",
            self.provider, self.cluster_name, self.context
        )
    }
}
