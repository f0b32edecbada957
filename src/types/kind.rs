// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Built-in resource kinds and the dependency order they are imported in.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::core::v1::{Namespace, Pod};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::discovery::ApiResource;

/// Coarse grouping of kinds by what they depend on at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KindCategory {
    Config,
    Storage,
    Network,
    Compute,
    Exposure,
    Custom,
}

impl KindCategory {
    pub const ALL: [KindCategory; 6] = [
        KindCategory::Config,
        KindCategory::Storage,
        KindCategory::Network,
        KindCategory::Compute,
        KindCategory::Exposure,
        KindCategory::Custom,
    ];

    /// Categories that must be applied before this one
    pub fn prerequisites(self) -> &'static [KindCategory] {
        match self {
            KindCategory::Config => &[],
            KindCategory::Storage => &[KindCategory::Config],
            KindCategory::Network => &[KindCategory::Config, KindCategory::Storage],
            KindCategory::Compute => &[KindCategory::Network],
            KindCategory::Exposure => &[KindCategory::Compute],
            KindCategory::Custom => &[KindCategory::Exposure],
        }
    }
}

/// Topologically sorted categories (Kahn's algorithm, ties broken by declaration order)
pub fn category_order() -> Vec<KindCategory> {
    let mut indegree: BTreeMap<KindCategory, usize> = KindCategory::ALL
        .iter()
        .map(|c| (*c, c.prerequisites().len()))
        .collect();
    let mut order = Vec::with_capacity(KindCategory::ALL.len());

    while let Some(next) = indegree
        .iter()
        .find(|(_, degree)| **degree == 0)
        .map(|(category, _)| *category)
    {
        indegree.remove(&next);
        order.push(next);
        for category in KindCategory::ALL {
            if category.prerequisites().contains(&next) {
                if let Some(degree) = indegree.get_mut(&category) {
                    *degree -= 1;
                }
            }
        }
    }

    debug_assert!(indegree.is_empty(), "kind category graph has a cycle");
    order
}

/// A namespaced built-in kind that can be exported and imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    /// Plural resource name, also the staging file stem
    pub plural: &'static str,
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub short_names: &'static [&'static str],
    pub category: KindCategory,
}

pub const BUILTIN_KINDS: &[ResourceKind] = &[
    ResourceKind {
        plural: "configmaps",
        group: "",
        version: "v1",
        kind: "ConfigMap",
        short_names: &["cm"],
        category: KindCategory::Config,
    },
    ResourceKind {
        plural: "secrets",
        group: "",
        version: "v1",
        kind: "Secret",
        short_names: &[],
        category: KindCategory::Config,
    },
    ResourceKind {
        plural: "serviceaccounts",
        group: "",
        version: "v1",
        kind: "ServiceAccount",
        short_names: &["sa"],
        category: KindCategory::Config,
    },
    ResourceKind {
        plural: "roles",
        group: "rbac.authorization.k8s.io",
        version: "v1",
        kind: "Role",
        short_names: &[],
        category: KindCategory::Config,
    },
    ResourceKind {
        plural: "rolebindings",
        group: "rbac.authorization.k8s.io",
        version: "v1",
        kind: "RoleBinding",
        short_names: &[],
        category: KindCategory::Config,
    },
    ResourceKind {
        plural: "persistentvolumeclaims",
        group: "",
        version: "v1",
        kind: "PersistentVolumeClaim",
        short_names: &["pvc"],
        category: KindCategory::Storage,
    },
    ResourceKind {
        plural: "services",
        group: "",
        version: "v1",
        kind: "Service",
        short_names: &["svc"],
        category: KindCategory::Network,
    },
    ResourceKind {
        plural: "networkpolicies",
        group: "networking.k8s.io",
        version: "v1",
        kind: "NetworkPolicy",
        short_names: &["netpol"],
        category: KindCategory::Network,
    },
    ResourceKind {
        plural: "deployments",
        group: "apps",
        version: "v1",
        kind: "Deployment",
        short_names: &["deploy"],
        category: KindCategory::Compute,
    },
    ResourceKind {
        plural: "statefulsets",
        group: "apps",
        version: "v1",
        kind: "StatefulSet",
        short_names: &["sts"],
        category: KindCategory::Compute,
    },
    ResourceKind {
        plural: "daemonsets",
        group: "apps",
        version: "v1",
        kind: "DaemonSet",
        short_names: &["ds"],
        category: KindCategory::Compute,
    },
    ResourceKind {
        plural: "jobs",
        group: "batch",
        version: "v1",
        kind: "Job",
        short_names: &[],
        category: KindCategory::Compute,
    },
    ResourceKind {
        plural: "cronjobs",
        group: "batch",
        version: "v1",
        kind: "CronJob",
        short_names: &["cj"],
        category: KindCategory::Compute,
    },
    ResourceKind {
        plural: "ingresses",
        group: "networking.k8s.io",
        version: "v1",
        kind: "Ingress",
        short_names: &["ing"],
        category: KindCategory::Exposure,
    },
    ResourceKind {
        plural: "horizontalpodautoscalers",
        group: "autoscaling",
        version: "v2",
        kind: "HorizontalPodAutoscaler",
        short_names: &["hpa"],
        category: KindCategory::Exposure,
    },
    ResourceKind {
        plural: "poddisruptionbudgets",
        group: "policy",
        version: "v1",
        kind: "PodDisruptionBudget",
        short_names: &["pdb"],
        category: KindCategory::Exposure,
    },
];

impl ResourceKind {
    /// Look up a kind by plural, singular, Kind or short name (case-insensitive)
    pub fn from_name(name: &str) -> Option<ResourceKind> {
        let needle = name.trim().to_ascii_lowercase();
        BUILTIN_KINDS
            .iter()
            .find(|k| {
                k.plural == needle
                    || k.kind.to_ascii_lowercase() == needle
                    || k.short_names.contains(&needle.as_str())
            })
            .copied()
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.to_string(),
            version: self.version.to_string(),
            api_version: self.api_version(),
            kind: self.kind.to_string(),
            plural: self.plural.to_string(),
        }
    }

    /// Staging file name for this kind
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.plural, crate::constants::staging::YAML_EXTENSION)
    }

    pub fn is_storage(&self) -> bool {
        self.category == KindCategory::Storage
    }

    fn position(&self) -> usize {
        BUILTIN_KINDS
            .iter()
            .position(|k| k.plural == self.plural)
            .unwrap_or(usize::MAX)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural)
    }
}

/// Parse a comma separated list of kind names, rejecting unknown ones
pub fn parse_kinds<S: AsRef<str>>(names: &[S]) -> std::result::Result<Vec<ResourceKind>, String> {
    let mut kinds: Vec<ResourceKind> = Vec::new();
    for name in names {
        let name = name.as_ref();
        let kind = ResourceKind::from_name(name)
            .ok_or_else(|| format!("unknown resource kind '{}'", name))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

/// Order kinds for import: by category rank, then by table position
pub fn import_order(kinds: &[ResourceKind]) -> Vec<ResourceKind> {
    let ranks: BTreeMap<KindCategory, usize> = category_order()
        .into_iter()
        .enumerate()
        .map(|(rank, category)| (category, rank))
        .collect();
    let mut ordered = kinds.to_vec();
    ordered.sort_by_key(|k| (ranks.get(&k.category).copied().unwrap_or(usize::MAX), k.position()));
    ordered.dedup();
    ordered
}

pub fn namespace_resource() -> ApiResource {
    ApiResource::erase::<Namespace>(&())
}

pub fn pod_resource() -> ApiResource {
    ApiResource::erase::<Pod>(&())
}

pub fn crd_resource() -> ApiResource {
    ApiResource::erase::<CustomResourceDefinition>(&())
}

/// Split an apiVersion into (group, version)
pub fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}
