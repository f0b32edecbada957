// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sequences the pipeline phases and owns the staging area lifecycle

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info, instrument, warn};

use crate::config::{MigrationOptions, Mode};
use crate::constants::staging::DIR_PREFIX;
use crate::error::{ConvertError, Result};
use crate::kubernetes::Connector;
use crate::migration::{
    export, import, resolve, sanitize, select, verify, ExportSummary, ImportSummary,
    MigrationSession, NamespacePlan, Phase, SanitizeSummary, StagingArea, WarningLog,
};
use crate::provider::ProviderCli;
use crate::types::{ClusterEndpoint, VerificationReport};

/// Everything a finished run produced
#[derive(Debug, Default)]
pub struct MigrationOutcome {
    pub staging_root: PathBuf,
    pub staging_retained: bool,
    pub dry_run: bool,
    pub export: Option<ExportSummary>,
    pub sanitize: Option<SanitizeSummary>,
    pub import: Option<ImportSummary>,
    pub report: Option<VerificationReport>,
    pub warnings: WarningLog,
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Migration summary{}",
            if self.dry_run { " (dry run)" } else { "" }
        )?;
        if let Some(export) = &self.export {
            writeln!(
                f,
                "  exported:  {} object(s) in {} collection(s) from {} namespace(s)",
                export.total_objects(),
                export.collections.len(),
                export.namespaces.len()
            )?;
        }
        if let Some(sanitize) = &self.sanitize {
            writeln!(
                f,
                "  sanitized: {} document(s), {} field(s) removed, {} file(s) quarantined",
                sanitize.documents,
                sanitize.fields_removed,
                sanitize.quarantined.len()
            )?;
        }
        if let Some(import) = &self.import {
            writeln!(
                f,
                "  imported:  {} applied, {} failed",
                import.applied, import.failed
            )?;
            if !import.skipped_namespaces.is_empty() {
                writeln!(
                    f,
                    "  skipped:   {}",
                    import.skipped_namespaces.join(", ")
                )?;
            }
        }
        if let Some(report) = &self.report {
            writeln!(f, "Verification:")?;
            write!(f, "{}", report)?;
        }
        if !self.dry_run {
            writeln!(
                f,
                "Staging: {} ({})",
                self.staging_root.display(),
                if self.staging_retained { "retained" } else { "removed" }
            )?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "Warnings ({}):", self.warnings.len())?;
            for warning in self.warnings.entries() {
                writeln!(f, "  {}", warning)?;
            }
        }
        Ok(())
    }
}

pub struct MigrationOrchestrator {
    options: MigrationOptions,
    source_connector: Arc<dyn Connector>,
    target_connector: Arc<dyn Connector>,
    provider_cli: Option<Arc<dyn ProviderCli>>,
}

fn default_staging_dir() -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("{}{}-{}", DIR_PREFIX, stamp, std::process::id()))
}

impl MigrationOrchestrator {
    pub fn new(
        options: MigrationOptions,
        source_connector: Arc<dyn Connector>,
        target_connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            options,
            source_connector,
            target_connector,
            provider_cli: None,
        }
    }

    pub fn with_provider_cli(mut self, cli: Arc<dyn ProviderCli>) -> Self {
        self.provider_cli = Some(cli);
        self
    }

    /// Resolve both endpoints and compute the namespace plan.
    ///
    /// Nothing is written anywhere. A target that still has to be created is
    /// left unresolved until `execute`.
    #[instrument(skip(self), fields(mode = ?self.options.mode))]
    pub async fn prepare(&self) -> Result<MigrationSession> {
        let source = match &self.options.source {
            Some(request) => Some(
                resolve(self.source_connector.as_ref(), request)
                    .await
                    .map_err(|e| e.in_phase(Phase::Resolve))?,
            ),
            None => None,
        };

        let target = match (&self.options.target, &self.options.create_target) {
            (Some(_), Some(spec)) => {
                info!("Target {} cluster {} is created once the run starts", spec.provider, spec.name);
                None
            }
            (Some(_), None) => Some(self.resolve_target().await?),
            (None, _) => None,
        };

        let staging = StagingArea::new(
            self.options
                .staging_dir
                .clone()
                .unwrap_or_else(default_staging_dir),
        );

        let plan = self
            .plan(source.as_ref(), &staging)
            .await
            .map_err(|e| e.in_phase(Phase::Select))?;

        Ok(MigrationSession {
            source,
            target,
            plan,
            kinds: self.options.kinds.clone(),
            staging,
            options: self.options.session.clone(),
        })
    }

    async fn resolve_target(&self) -> Result<ClusterEndpoint> {
        let request = self.options.target.as_ref().ok_or_else(|| {
            ConvertError::Config("no target cluster configured".to_string())
        })?;
        resolve(self.target_connector.as_ref(), request)
            .await
            .map_err(|e| e.in_phase(Phase::Resolve))
    }

    /// Create the target with its provider CLI and resolve it
    async fn provision_target(&self, session: &mut MigrationSession) -> Result<()> {
        let Some(spec) = &self.options.create_target else {
            return Ok(());
        };
        if session.target.is_some() {
            return Ok(());
        }
        if session.options.dry_run {
            info!("Dry run: would create {} cluster {}", spec.provider, spec.name);
            return Ok(());
        }
        let cli = self.provider_cli.as_ref().ok_or_else(|| {
            ConvertError::Config("cluster creation requested without a provider CLI".to_string())
        })?;
        cli.check_installed(spec.provider)
            .await
            .map_err(|e| e.in_phase(Phase::Resolve))?;
        cli.create_cluster(spec)
            .await
            .map_err(|e| e.in_phase(Phase::Resolve))?;
        session.target = Some(self.resolve_target().await?);
        Ok(())
    }

    /// Namespaces from the source, or from an existing staging area
    async fn plan(&self, source: Option<&ClusterEndpoint>, staging: &StagingArea) -> Result<NamespacePlan> {
        let selection = &self.options.selection;
        if let Some(source) = source {
            return select(selection, source).await;
        }
        if !staging.exists() {
            return Err(ConvertError::Config(format!(
                "staging directory {} does not exist",
                staging.root().display()
            )));
        }
        let candidates = if selection.include.is_empty() {
            staging.namespaces()?
        } else {
            selection.include.clone()
        };
        let plan = NamespacePlan::new(selection.filter(candidates))?;
        info!(
            "Using {} staged namespace(s): {}",
            plan.len(),
            plan.as_slice().join(", ")
        );
        Ok(plan)
    }

    /// Run the phases for the configured mode
    #[instrument(skip_all, fields(mode = ?self.options.mode))]
    pub async fn execute(&self, mut session: MigrationSession) -> Result<MigrationOutcome> {
        self.provision_target(&mut session).await?;

        let mode = self.options.mode;
        let mut outcome = MigrationOutcome {
            staging_root: session.staging.root().to_path_buf(),
            dry_run: session.options.dry_run,
            ..MigrationOutcome::default()
        };

        if let Err(e) = self.run_phases(mode, &session, &mut outcome).await {
            if session.staging.exists() {
                error!(
                    "Migration stopped; staging area kept at {} for a manual re-run",
                    session.staging.root().display()
                );
            }
            return Err(e);
        }

        let remove = mode == Mode::Convert
            && !session.options.keep_staging
            && !session.options.dry_run
            && session.staging.exists();
        if remove {
            match session.staging.remove(session.plan.as_slice()) {
                Ok(()) => info!("Removed staging area {}", session.staging.root().display()),
                Err(e) => {
                    outcome.warnings.push(Phase::Verify, "staging", e);
                    outcome.staging_retained = true;
                }
            }
        } else {
            outcome.staging_retained = session.staging.exists();
        }

        Ok(outcome)
    }

    async fn run_phases(
        &self,
        mode: Mode,
        session: &MigrationSession,
        outcome: &mut MigrationOutcome,
    ) -> Result<()> {
        if mode.needs_source() {
            let exported = export(session, &mut outcome.warnings)
                .await
                .map_err(|e| e.in_phase(Phase::Export))?;
            outcome.export = Some(exported);

            let sanitized = sanitize(&session.staging, &mut outcome.warnings)
                .map_err(|e| e.in_phase(Phase::Sanitize))?;
            outcome.sanitize = Some(sanitized);
        }

        if mode.mutates_target() {
            let imported = import(session, outcome.export.as_ref(), &mut outcome.warnings)
                .await
                .map_err(|e| e.in_phase(Phase::Import))?;
            outcome.import = Some(imported);
        }

        if mode.needs_target() {
            if session.options.dry_run {
                info!("Dry run: skipping verification");
            } else {
                let report = verify(session)
                    .await
                    .map_err(|e| e.in_phase(Phase::Verify))?;
                if !report.is_clean() {
                    warn!("Verification reported {} discrepancy(ies)", report.warnings().len());
                }
                outcome.report = Some(report);
            }
        }
        Ok(())
    }
}
