// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::fmt;

use clap::ValueEnum;

/// Where a cluster runs, which decides how its kubeconfig context is named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Provider {
    Kind,
    K3d,
    Minikube,
    Eks,
    Gke,
    Aks,
    Generic,
}

impl Provider {
    /// Local providers name their context deterministically after the cluster
    pub fn is_local(self) -> bool {
        matches!(self, Provider::Kind | Provider::K3d | Provider::Minikube)
    }

    /// Context name prefix used by local providers
    pub fn context_prefix(self) -> Option<&'static str> {
        match self {
            Provider::Kind => Some("kind-"),
            Provider::K3d => Some("k3d-"),
            Provider::Minikube => Some(""),
            _ => None,
        }
    }

    /// The provider CLI used to create clusters
    pub fn cli_binary(self) -> Option<&'static str> {
        match self {
            Provider::Kind => Some("kind"),
            Provider::K3d => Some("k3d"),
            Provider::Minikube => Some("minikube"),
            Provider::Eks => Some("eksctl"),
            Provider::Gke => Some("gcloud"),
            Provider::Aks => Some("az"),
            Provider::Generic => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Kind => "kind",
            Provider::K3d => "k3d",
            Provider::Minikube => "minikube",
            Provider::Eks => "eks",
            Provider::Gke => "gke",
            Provider::Aks => "aks",
            Provider::Generic => "generic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
