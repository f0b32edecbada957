// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Compare the target against what was staged. Never fails the migration.

use std::path::Path;

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::kubernetes::crd::custom_resource_api;
use crate::kubernetes::ControlPlane;
use crate::migration::{MigrationSession, StagingArea};
use crate::types::kind::{namespace_resource, pod_resource};
use crate::types::{KindCount, Manifest, NamespaceReport, PodReadiness, VerificationReport};

/// Staged document count, falling back to a quarantined `.bak` copy
fn expected_count(path: &Path) -> Option<usize> {
    let staged = StagingArea::read(path).ok().flatten().or_else(|| {
        std::fs::read_to_string(StagingArea::backup_path(path))
            .ok()
            .and_then(|yaml| Manifest::parse(&yaml).ok())
    })?;
    Some(staged.len())
}

/// Build the verification report for every planned namespace
#[instrument(skip_all)]
pub async fn verify(session: &MigrationSession) -> Result<VerificationReport> {
    let target = session.target()?;
    let client = target.client();
    let mut report = VerificationReport::default();

    for namespace in session.plan.iter() {
        report
            .namespaces
            .push(verify_namespace(session, client, namespace).await);
    }

    let warnings = report.warnings();
    if warnings.is_empty() {
        info!("Verification found no discrepancies");
    } else {
        for warning in &warnings {
            warn!("{}", warning);
        }
    }
    Ok(report)
}

async fn verify_namespace(
    session: &MigrationSession,
    client: &dyn ControlPlane,
    namespace: &str,
) -> NamespaceReport {
    let mut report = NamespaceReport::new(namespace);

    match client.get(&namespace_resource(), None, namespace).await {
        Ok(Some(_)) => report.exists = true,
        Ok(None) => return report,
        Err(e) => {
            report.notes.push(format!("namespace lookup failed: {}", e));
            return report;
        }
    }

    for kind in &session.kinds {
        if session.skips_kind(kind) {
            continue;
        }
        let path = session.staging.kind_path(namespace, kind);
        let Some(expected) = expected_count(&path) else {
            if StagingArea::backup_path(&path).is_file() {
                report
                    .notes
                    .push(format!("quarantined {} could not be read", kind.plural));
            }
            continue;
        };
        let observed = client
            .list(&kind.api_resource(), Some(namespace))
            .await
            .map(|items| items.len())
            .ok();
        report.counts.push(KindCount {
            kind: kind.plural.to_string(),
            expected,
            observed,
        });
    }

    if session.options.include_custom_resources {
        let mut files = session
            .staging
            .custom_resource_files(namespace)
            .unwrap_or_default();
        files.extend(
            session
                .staging
                .quarantined_custom_resource_files(namespace)
                .unwrap_or_default(),
        );
        for (crd_name, path) in files {
            let Some(staged) = StagingArea::read(&path).ok().flatten() else {
                report
                    .notes
                    .push(format!("staged {} could not be read", crd_name));
                continue;
            };
            let Some(first) = staged.documents().first() else {
                continue;
            };
            let observed = match custom_resource_api(&crd_name, first) {
                Ok(resource) => client
                    .list(&resource, Some(namespace))
                    .await
                    .map(|items| items.len())
                    .ok(),
                Err(_) => None,
            };
            report.counts.push(KindCount {
                kind: crd_name,
                expected: staged.len(),
                observed,
            });
        }
    }

    match client.list(&pod_resource(), Some(namespace)).await {
        Ok(pods) => {
            let running = pods
                .iter()
                .filter(|p| p.value().pointer("/status/phase").and_then(Value::as_str) == Some("Running"))
                .count();
            report.pods = Some(PodReadiness {
                running,
                total: pods.len(),
            });
        }
        Err(e) => report.notes.push(format!("pod listing failed: {}", e)),
    }

    report
}
