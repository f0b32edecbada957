// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `ProviderCli` on top of the providers' own command-line tools

use std::io::ErrorKind;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::error::{ConvertError, Result};
use crate::provider::{ClusterSpec, CommandRunner, ProviderCli};
use crate::types::Provider;

/// Invocation of a provider CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: &'static str,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

/// kind needs a config document for more than one node
fn kind_config(node_count: u32) -> String {
    let mut config = String::from(
        "kind: Cluster\napiVersion: kind.x-k8s.io/v1alpha4\nnodes:\n- role: control-plane\n",
    );
    for _ in 1..node_count {
        config.push_str("- role: worker\n");
    }
    config
}

fn args<const N: usize>(fixed: [&str; N]) -> Vec<String> {
    fixed.iter().map(|s| s.to_string()).collect()
}

/// Build the create command for a cluster spec
pub fn create_invocation(spec: &ClusterSpec) -> Result<Invocation> {
    let program = spec.provider.cli_binary().ok_or_else(|| {
        ConvertError::Config(format!(
            "provider {} cannot create clusters, create the target manually",
            spec.provider
        ))
    })?;
    let name = spec.name.clone();
    let nodes = spec.node_count.to_string();
    let mut stdin = None;

    let argv = match spec.provider {
        Provider::Kind => {
            let mut argv = args(["create", "cluster", "--name"]);
            argv.push(name);
            if spec.node_count > 1 {
                argv.extend(args(["--config", "-"]));
                stdin = Some(kind_config(spec.node_count));
            }
            if let Some(version) = &spec.version {
                argv.push("--image".to_string());
                argv.push(format!("kindest/node:{}", version));
            }
            argv
        }
        Provider::K3d => {
            let mut argv = args(["cluster", "create"]);
            argv.push(name);
            argv.push("--agents".to_string());
            argv.push(spec.node_count.saturating_sub(1).to_string());
            if let Some(version) = &spec.version {
                argv.push("--image".to_string());
                argv.push(format!("rancher/k3s:{}", version));
            }
            argv
        }
        Provider::Minikube => {
            let mut argv = args(["start", "-p"]);
            argv.extend([name, "--nodes".to_string(), nodes]);
            if let Some(version) = &spec.version {
                argv.push(format!("--kubernetes-version={}", version));
            }
            argv
        }
        Provider::Eks => {
            let mut argv = args(["create", "cluster", "--name"]);
            argv.extend([name, "--nodes".to_string(), nodes]);
            if let Some(version) = &spec.version {
                argv.push("--version".to_string());
                argv.push(version.clone());
            }
            argv
        }
        Provider::Gke => {
            let mut argv = args(["container", "clusters", "create"]);
            argv.extend([name, "--num-nodes".to_string(), nodes]);
            if let Some(version) = &spec.version {
                argv.push("--cluster-version".to_string());
                argv.push(version.clone());
            }
            argv
        }
        Provider::Aks => {
            let group = spec.resource_group.clone().ok_or_else(|| {
                ConvertError::Config("AKS cluster creation needs a resource group".to_string())
            })?;
            let mut argv = args(["aks", "create", "--name"]);
            argv.extend([
                name,
                "--resource-group".to_string(),
                group,
                "--node-count".to_string(),
                nodes,
            ]);
            if let Some(version) = &spec.version {
                argv.push("--kubernetes-version".to_string());
                argv.push(version.clone());
            }
            argv
        }
        Provider::Generic => Vec::new(),
    };
    Ok(Invocation {
        program,
        args: argv,
        stdin,
    })
}

fn version_args(provider: Provider) -> Vec<String> {
    match provider {
        Provider::Gke => args(["--version"]),
        _ => args(["version"]),
    }
}

pub struct ShellProviderCli<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> ShellProviderCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> ConvertError {
    if e.kind() == ErrorKind::NotFound {
        ConvertError::MissingTool(program.to_string())
    } else {
        ConvertError::ProviderCli(format!("failed to run {}: {}", program, e))
    }
}

#[async_trait]
impl<R: CommandRunner> ProviderCli for ShellProviderCli<R> {
    async fn check_installed(&self, provider: Provider) -> Result<()> {
        let program = provider.cli_binary().ok_or_else(|| {
            ConvertError::Config(format!("provider {} has no command-line tool", provider))
        })?;
        let output = self
            .runner
            .run(program, &version_args(provider), None)
            .await
            .map_err(|e| spawn_error(program, e))?;
        if !output.success {
            return Err(ConvertError::MissingTool(program.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(provider = %spec.provider, cluster = %spec.name))]
    async fn create_cluster(&self, spec: &ClusterSpec) -> Result<()> {
        let invocation = create_invocation(spec)?;
        info!(
            "Creating {} cluster {} with {} node(s)",
            spec.provider, spec.name, spec.node_count
        );
        let output = self
            .runner
            .run(
                invocation.program,
                &invocation.args,
                invocation.stdin.as_deref(),
            )
            .await
            .map_err(|e| spawn_error(invocation.program, e))?;
        if !output.success {
            return Err(ConvertError::ProviderCli(format!(
                "{} {} failed: {}",
                invocation.program,
                invocation.args.join(" "),
                output.stderr.trim()
            )));
        }
        info!("Cluster {} created", spec.name);
        Ok(())
    }
}
