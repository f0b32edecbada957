// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Apply staged manifests to the target cluster in dependency order

use std::path::Path;

use kube::discovery::ApiResource;
use tracing::{debug, info, instrument};

use crate::error::{ConvertError, Result};
use crate::kubernetes::crd::custom_resource_api;
use crate::kubernetes::{ensure_namespace_exists, ControlPlane};
use crate::migration::{ExportSummary, MigrationSession, Phase, StagingArea, WarningLog};
use crate::types::kind::{crd_resource, import_order, namespace_resource};
use crate::types::{Manifest, ResourceDocument};

/// Outcome of an import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub applied: usize,
    pub failed: usize,
    /// Namespaces that could not be created on the target
    pub skipped_namespaces: Vec<String>,
}

/// Apply staged manifests to the target.
///
/// Order: CRDs (then a settle delay), and per namespace the namespace itself,
/// built-in kinds by category, then custom resources in file order. Only a
/// failure to create every planned namespace is fatal.
#[instrument(skip_all)]
pub async fn import(
    session: &MigrationSession,
    planned: Option<&ExportSummary>,
    warnings: &mut WarningLog,
) -> Result<ImportSummary> {
    if session.options.dry_run {
        log_plan(session, planned);
        return Ok(ImportSummary::default());
    }

    let target = session.target()?;
    let client = target.client();
    let mut summary = ImportSummary::default();
    info!("Importing into {}", target);

    if session.options.include_custom_resources {
        let applied = import_crds(session, client, &mut summary, warnings).await;
        if applied > 0 && !session.options.crd_settle_delay.is_zero() {
            info!(
                "Waiting {}s for {} CRD(s) to register",
                session.options.crd_settle_delay.as_secs(),
                applied
            );
            tokio::time::sleep(session.options.crd_settle_delay).await;
        }
    }

    for namespace in session.plan.iter() {
        if let Err(e) = import_namespace_definition(session, client, namespace).await {
            warnings.push(Phase::Import, namespace, &e);
            summary.skipped_namespaces.push(namespace.to_string());
            continue;
        }
        import_namespace(session, client, namespace, &mut summary, warnings).await;
    }

    if summary.skipped_namespaces.len() == session.plan.len() {
        return Err(ConvertError::NamespaceError(format!(
            "no namespace could be created on target ({})",
            summary.skipped_namespaces.join(", ")
        )));
    }

    info!(
        "Import finished: {} applied, {} failed, {} namespace(s) skipped",
        summary.applied,
        summary.failed,
        summary.skipped_namespaces.len()
    );
    Ok(summary)
}

fn log_plan(session: &MigrationSession, planned: Option<&ExportSummary>) {
    match planned {
        Some(export) => {
            if session.options.include_custom_resources && export.crd_count() > 0 {
                info!("Would apply {} CRD(s)", export.crd_count());
            }
            for namespace in session.plan.iter() {
                info!("Would create or update namespace {}", namespace);
                for kind in import_order(&session.kinds) {
                    if session.skips_kind(&kind) {
                        continue;
                    }
                    if let Some(count) = export.count(Some(namespace), kind.plural) {
                        info!("Would apply {} {} in {}", count, kind, namespace);
                    }
                }
                for custom in export.in_namespace(namespace).filter(|c| c.custom) {
                    info!("Would apply {} {} in {}", custom.count, custom.name, namespace);
                }
            }
        }
        None => {
            for namespace in session.plan.iter() {
                info!("Would import namespace {} from {}", namespace, session.staging.root().display());
            }
        }
    }
}

async fn import_crds(
    session: &MigrationSession,
    client: &dyn ControlPlane,
    summary: &mut ImportSummary,
    warnings: &mut WarningLog,
) -> usize {
    let path = session.staging.crds_path();
    let manifest = match StagingArea::read(&path) {
        Ok(Some(manifest)) => manifest,
        Ok(None) => {
            debug!("No CRDs staged");
            return 0;
        }
        Err(e) => {
            warnings.push(Phase::Import, "crds", e);
            return 0;
        }
    };

    let resource = crd_resource();
    let before = summary.applied;
    for document in manifest.documents() {
        apply_one(client, &resource, document, summary, warnings).await;
    }
    summary.applied - before
}

/// Apply the staged namespace, or create a bare one if none was staged
async fn import_namespace_definition(
    session: &MigrationSession,
    client: &dyn ControlPlane,
    namespace: &str,
) -> Result<()> {
    let staged = StagingArea::read(&session.staging.namespace_path(namespace)).ok().flatten();
    match staged {
        Some(Manifest::Single(document)) => client
            .apply(&namespace_resource(), &document)
            .await
            .map_err(|e| {
                ConvertError::NamespaceError(format!("Failed to apply namespace {}: {}", namespace, e))
            }),
        _ => ensure_namespace_exists(client, namespace).await,
    }
}

#[instrument(skip(session, client, summary, warnings))]
async fn import_namespace(
    session: &MigrationSession,
    client: &dyn ControlPlane,
    namespace: &str,
    summary: &mut ImportSummary,
    warnings: &mut WarningLog,
) {
    for kind in import_order(&session.kinds) {
        if session.skips_kind(&kind) {
            debug!("Skipping {} in {}: storage handling not requested", kind, namespace);
            continue;
        }
        let path = session.staging.kind_path(namespace, &kind);
        let Some(manifest) = read_staged(&path, warnings) else {
            continue;
        };
        if kind.is_storage() && session.options.transfer_storage {
            info!(
                "Recreating {} claim(s) in {}; volume data must be copied separately",
                manifest.len(),
                namespace
            );
        }
        let resource = kind.api_resource();
        for document in manifest.documents() {
            let mut document = document.clone();
            document.set_namespace(namespace);
            apply_one(client, &resource, &document, summary, warnings).await;
        }
    }

    if !session.options.include_custom_resources {
        return;
    }

    let files = match session.staging.custom_resource_files(namespace) {
        Ok(files) => files,
        Err(e) => {
            warnings.push(Phase::Import, format!("{}/custom-resources", namespace), e);
            return;
        }
    };
    for (crd_name, path) in files {
        let Some(manifest) = read_staged(&path, warnings) else {
            continue;
        };
        for document in manifest.documents() {
            let resource = match custom_resource_api(&crd_name, document) {
                Ok(resource) => resource,
                Err(e) => {
                    summary.failed += 1;
                    warnings.push(Phase::Import, format!("{}/{}", namespace, crd_name), e);
                    continue;
                }
            };
            let mut document = document.clone();
            document.set_namespace(namespace);
            apply_one(client, &resource, &document, summary, warnings).await;
        }
    }
}

fn read_staged(path: &Path, warnings: &mut WarningLog) -> Option<Manifest> {
    match StagingArea::read(path) {
        Ok(manifest) => manifest,
        Err(e) => {
            warnings.push(Phase::Import, path.display().to_string(), e);
            None
        }
    }
}

async fn apply_one(
    client: &dyn ControlPlane,
    resource: &ApiResource,
    document: &ResourceDocument,
    summary: &mut ImportSummary,
    warnings: &mut WarningLog,
) {
    match client.apply(resource, document).await {
        Ok(()) => {
            debug!("Applied {}", document.display_name());
            summary.applied += 1;
        }
        Err(e) => {
            summary.failed += 1;
            let subject = match document.namespace() {
                Some(ns) => format!("{}/{}", ns, document.display_name()),
                None => document.display_name(),
            };
            warnings.push(Phase::Import, subject, e);
        }
    }
}
