// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use thiserror::Error;

use crate::migration::Phase;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("No kubeconfig context found for {provider} cluster '{cluster}'")]
    NotFound { provider: String, cluster: String },

    #[error("Cluster context '{context}' is unreachable: {reason}")]
    Unreachable { context: String, reason: String },

    #[error("Cluster '{cluster}' matches multiple contexts: {}", candidates.join(", "))]
    AmbiguousContext {
        cluster: String,
        candidates: Vec<String>,
    },

    #[error("No namespaces left to migrate after filtering")]
    NoNamespaces,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Namespace creation failed: {0}")]
    NamespaceError(String),

    #[error("Staging area error at {}: {source}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Operation '{operation}' timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Required tool '{0}' is not installed or not on PATH")]
    MissingTool(String),

    #[error("Provider CLI failed: {0}")]
    ProviderCli(String),

    #[error("Migration aborted by operator")]
    Aborted,

    #[error("Failed to read confirmation: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("{phase} phase failed: {source}")]
    PhaseFailed {
        phase: Phase,
        #[source]
        source: Box<ConvertError>,
    },
}

/// How far an error propagates through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Stops the whole session
    Fatal,
    /// Skips the current namespace only
    NamespaceFatal,
    /// Recorded and surfaced in the summary
    Warning,
}

impl ConvertError {
    pub fn severity(&self) -> Severity {
        match self {
            ConvertError::NamespaceError(_) => Severity::NamespaceFatal,
            ConvertError::KubeError(_)
            | ConvertError::Staging { .. }
            | ConvertError::Yaml(_)
            | ConvertError::Json(_)
            | ConvertError::InvalidManifest(_)
            | ConvertError::Timeout { .. } => Severity::Warning,
            ConvertError::PhaseFailed { source, .. } => source.severity(),
            _ => Severity::Fatal,
        }
    }

    /// Attach the pipeline phase to a fatal error
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            ConvertError::PhaseFailed { .. } => self,
            other => ConvertError::PhaseFailed {
                phase,
                source: Box::new(other),
            },
        }
    }

    pub(crate) fn staging(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ConvertError::Staging { path, source }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_errors_only_abort_the_namespace() {
        let err = ConvertError::NamespaceError("app".to_string());
        assert_eq!(err.severity(), Severity::NamespaceFatal);
    }

    #[test]
    fn test_resolution_errors_are_fatal() {
        let err = ConvertError::AmbiguousContext {
            cluster: "prod".to_string(),
            candidates: vec!["gke_a_prod".to_string(), "gke_b_prod".to_string()],
        };
        assert_eq!(err.severity(), Severity::Fatal);
        assert_eq!(
            err.to_string(),
            "Cluster 'prod' matches multiple contexts: gke_a_prod, gke_b_prod"
        );
        assert_eq!(ConvertError::NoNamespaces.severity(), Severity::Fatal);
    }

    #[test]
    fn test_per_resource_errors_are_warnings() {
        let err = ConvertError::Timeout {
            operation: "list deployments".to_string(),
            seconds: 30,
        };
        assert_eq!(err.severity(), Severity::Warning);
    }

    #[test]
    fn test_in_phase_wraps_once() {
        let err = ConvertError::NoNamespaces
            .in_phase(Phase::Select)
            .in_phase(Phase::Import);
        assert_eq!(
            err.to_string(),
            "select phase failed: No namespaces left to migrate after filtering"
        );
        assert_eq!(err.severity(), Severity::Fatal);
    }
}
