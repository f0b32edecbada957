// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resolve a (provider, cluster) pair to a reachable, context-bound endpoint

use std::path::PathBuf;

use tracing::{debug, info, instrument};

use crate::error::{ConvertError, Result};
use crate::kubernetes::Connector;
use crate::types::{ClusterEndpoint, Credential, Provider};

/// How the operator identified one side of the migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRequest {
    pub provider: Provider,
    pub cluster_name: String,
    /// Used verbatim when given
    pub context: Option<String>,
    pub kubeconfig: Option<PathBuf>,
}

/// Derive the kubeconfig context for a cluster by provider convention.
///
/// Local providers name contexts `<prefix><cluster>`; hosted providers embed
/// the cluster name somewhere in the context, so exactly one context must
/// contain it.
pub fn derive_context(provider: Provider, cluster_name: &str, contexts: &[String]) -> Result<String> {
    let not_found = || ConvertError::NotFound {
        provider: provider.to_string(),
        cluster: cluster_name.to_string(),
    };

    if let Some(prefix) = provider.context_prefix() {
        let expected = format!("{}{}", prefix, cluster_name);
        return contexts
            .iter()
            .find(|c| **c == expected)
            .cloned()
            .ok_or_else(not_found);
    }

    if provider == Provider::Generic {
        if let Some(exact) = contexts.iter().find(|c| *c == cluster_name) {
            return Ok(exact.clone());
        }
    }

    let candidates: Vec<String> = contexts
        .iter()
        .filter(|c| c.contains(cluster_name))
        .cloned()
        .collect();

    match candidates.len() {
        0 => Err(not_found()),
        1 => Ok(candidates.into_iter().next().unwrap_or_default()),
        _ => Err(ConvertError::AmbiguousContext {
            cluster: cluster_name.to_string(),
            candidates,
        }),
    }
}

/// Resolve an endpoint and confirm the control plane answers
#[instrument(skip(connector, request), fields(provider = %request.provider, cluster = %request.cluster_name))]
pub async fn resolve(connector: &dyn Connector, request: &EndpointRequest) -> Result<ClusterEndpoint> {
    let contexts = connector.contexts().await?;
    debug!("Kubeconfig has {} context(s)", contexts.len());

    let context = match &request.context {
        Some(explicit) => {
            if !contexts.contains(explicit) {
                return Err(ConvertError::NotFound {
                    provider: request.provider.to_string(),
                    cluster: format!("{} (context {})", request.cluster_name, explicit),
                });
            }
            explicit.clone()
        }
        None => derive_context(request.provider, &request.cluster_name, &contexts)?,
    };

    let client = connector
        .connect(&context)
        .await
        .map_err(|e| ConvertError::Unreachable {
            context: context.clone(),
            reason: e.to_string(),
        })?;

    let version = client
        .server_version()
        .await
        .map_err(|e| ConvertError::Unreachable {
            context: context.clone(),
            reason: e.to_string(),
        })?;

    info!(
        "Connected to {} cluster '{}' via context '{}' (Kubernetes {})",
        request.provider, request.cluster_name, context, version
    );

    Ok(ClusterEndpoint::new(
        request.provider,
        request.cluster_name.clone(),
        Credential {
            kubeconfig: request
                .kubeconfig
                .clone()
                .or_else(|| connector.kubeconfig_path().map(|p| p.to_path_buf())),
            context,
        },
        client,
    ))
}
