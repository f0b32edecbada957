// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::config::{MigrateArgs, MigrationOptions, Mode};
use crate::error::{ConvertError, Result};
use crate::kubernetes::KubeconfigConnector;
use crate::migration::{MigrationOrchestrator, MigrationOutcome, MigrationSession};
use crate::provider::{ShellProviderCli, TokioCommandRunner};

/// Move namespaced workloads between Kubernetes clusters
#[derive(Parser, Debug)]
#[command(name = "clusterconvert", version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export, sanitize, import and verify in one run
    Convert(MigrateArgs),
    /// Export and sanitize into a staging directory
    Export(MigrateArgs),
    /// Import a staging directory into the target
    Import(MigrateArgs),
    /// Compare the target against a staging directory
    Verify(MigrateArgs),
}

impl Command {
    fn into_parts(self) -> (Mode, MigrateArgs) {
        match self {
            Command::Convert(args) => (Mode::Convert, args),
            Command::Export(args) => (Mode::Export, args),
            Command::Import(args) => (Mode::Import, args),
            Command::Verify(args) => (Mode::Verify, args),
        }
    }
}

fn print_plan(options: &MigrationOptions, session: &MigrationSession) {
    println!("Migration plan ({:?})", options.mode);
    if let Some(source) = &session.source {
        println!("  source:     {}", source);
    }
    if let Some(target) = &session.target {
        println!("  target:     {}", target);
    } else if let Some(spec) = &options.create_target {
        println!(
            "  target:     new {} cluster {} ({} node(s))",
            spec.provider, spec.name, spec.node_count
        );
    }
    println!("  namespaces: {}", session.plan.as_slice().join(", "));
    let kinds: Vec<&str> = session.kinds.iter().map(|k| k.plural).collect();
    println!("  resources:  {}", kinds.join(", "));
    println!("  staging:    {}", session.staging.root().display());
}

/// Asks the operator before the target is touched
#[async_trait]
pub trait Prompt: Send + Sync {
    async fn confirm(&self, question: &str) -> Result<bool>;
}

pub struct StdinPrompt;

#[async_trait]
impl Prompt for StdinPrompt {
    async fn confirm(&self, question: &str) -> Result<bool> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("{} [y/N] ", question).as_bytes())
            .await
            .map_err(ConvertError::Prompt)?;
        stdout.flush().await.map_err(ConvertError::Prompt)?;

        let mut input = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut input)
            .await
            .map_err(ConvertError::Prompt)?;
        Ok(input.trim().eq_ignore_ascii_case("y"))
    }
}

fn confirmation_question(options: &MigrationOptions) -> String {
    match &options.create_target {
        Some(spec) => format!(
            "Create {} cluster {} and apply these resources to it?",
            spec.provider, spec.name
        ),
        None => "Apply these resources to the target cluster?".to_string(),
    }
}

/// Plan the run, ask before any target mutation, then execute it
pub async fn run_migration(
    orchestrator: &MigrationOrchestrator,
    options: &MigrationOptions,
    prompt: &dyn Prompt,
) -> Result<MigrationOutcome> {
    let session = orchestrator.prepare().await?;
    print_plan(options, &session);

    let ask = options.mode.mutates_target() && !options.force && !options.session.dry_run;
    if ask && !prompt.confirm(&confirmation_question(options)).await? {
        info!("Migration declined by operator");
        return Err(ConvertError::Aborted);
    }

    orchestrator.execute(session).await
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let (mode, args) = self.command.into_parts();
        let options = args.into_options(mode)?;
        let timeout = options.session.timeout;

        let source_connector = Arc::new(KubeconfigConnector::new(
            options.source.as_ref().and_then(|s| s.kubeconfig.clone()),
            timeout,
        ));
        let target_connector = Arc::new(KubeconfigConnector::new(
            options.target.as_ref().and_then(|t| t.kubeconfig.clone()),
            timeout,
        ));

        let mut orchestrator =
            MigrationOrchestrator::new(options.clone(), source_connector, target_connector);
        if options.create_target.is_some() {
            orchestrator =
                orchestrator.with_provider_cli(Arc::new(ShellProviderCli::new(TokioCommandRunner)));
        }

        let outcome = run_migration(&orchestrator, &options, &StdinPrompt).await?;
        println!("{}", outcome);
        Ok(())
    }
}
