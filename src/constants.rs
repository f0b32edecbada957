// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The field manager name used for server-side apply
pub const FIELD_MANAGER: &str = "clusterconvert";

/// Default per-call timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Resource kinds exported when `--resources` is not given
pub const DEFAULT_RESOURCES: &[&str] = &[
    "configmaps",
    "secrets",
    "serviceaccounts",
    "persistentvolumeclaims",
    "services",
    "deployments",
    "statefulsets",
    "daemonsets",
    "ingresses",
    "horizontalpodautoscalers",
];

/// Namespace selection defaults
pub mod namespaces {
    /// Control-plane and provider system namespaces, never migrated by default
    pub const DEFAULT_EXCLUDED: &[&str] = &[
        "kube-system",
        "kube-public",
        "kube-node-lease",
        "local-path-storage",
        "gke-managed-system",
        "gmp-system",
        "gmp-public",
    ];
}

/// Annotation keys handled during export and sanitization
pub mod annotations {
    pub const LAST_APPLIED: &str = "kubectl.kubernetes.io/last-applied-configuration";
}

/// Objects the target control plane creates on its own
pub mod managed {
    pub const ROOT_CA_CONFIGMAP: &str = "kube-root-ca.crt";
    pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";
    pub const SERVICE_ACCOUNT_TOKEN_TYPE: &str = "kubernetes.io/service-account-token";
}

/// CRD handling
pub mod crd {
    /// Seconds to wait after applying CRDs before applying custom resources
    pub const SETTLE_DELAY_SECS: u64 = 10;
    /// API groups owned by Kubernetes itself
    pub const BUILTIN_GROUP_SUFFIXES: &[&str] = &["k8s.io", "kubernetes.io"];
}

/// On-disk staging layout
pub mod staging {
    pub const CRDS_FILE: &str = "crds.yaml";
    pub const NAMESPACE_FILE: &str = "namespace.yaml";
    pub const CUSTOM_RESOURCES_DIR: &str = "custom-resources";
    pub const YAML_EXTENSION: &str = "yaml";
    pub const BACKUP_SUFFIX: &str = ".bak";
    pub const DIR_PREFIX: &str = "clusterconvert-";
}
