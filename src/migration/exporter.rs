// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Source cluster export into the staging area

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::constants::managed::{
    DEFAULT_SERVICE_ACCOUNT, ROOT_CA_CONFIGMAP, SERVICE_ACCOUNT_TOKEN_TYPE,
};
use crate::error::Result;
use crate::kubernetes::{ControlPlane, CrdInfo};
use crate::migration::{MigrationSession, Phase, WarningLog};
use crate::types::kind::{crd_resource, namespace_resource};
use crate::types::{DocumentList, Manifest, ResourceDocument, ResourceKind};

/// One collection found on the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedCollection {
    /// `None` for the cluster-wide CRD collection
    pub namespace: Option<String>,
    /// Kind plural or CRD name
    pub name: String,
    pub count: usize,
    pub custom: bool,
}

/// What an export found, written or (in dry-run) only planned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub namespaces: Vec<String>,
    pub collections: Vec<ExportedCollection>,
}

impl ExportSummary {
    fn record(&mut self, namespace: Option<&str>, name: &str, count: usize, custom: bool) {
        self.collections.push(ExportedCollection {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            count,
            custom,
        });
    }

    /// Exported instance count of a collection
    pub fn count(&self, namespace: Option<&str>, name: &str) -> Option<usize> {
        self.collections
            .iter()
            .find(|c| c.namespace.as_deref() == namespace && c.name == name)
            .map(|c| c.count)
    }

    pub fn crd_count(&self) -> usize {
        self.count(None, "crds").unwrap_or(0)
    }

    /// Collections of one namespace in export order
    pub fn in_namespace<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a ExportedCollection> + 'a {
        self.collections
            .iter()
            .filter(move |c| c.namespace.as_deref() == Some(namespace))
    }

    pub fn total_objects(&self) -> usize {
        self.collections.iter().map(|c| c.count).sum()
    }
}

/// Whether the target control plane recreates this object by itself
pub fn is_control_plane_managed(kind: &ResourceKind, document: &ResourceDocument) -> bool {
    let value = document.value();
    let owned_by_controller = value
        .pointer("/metadata/ownerReferences")
        .and_then(Value::as_array)
        .is_some_and(|refs| {
            refs.iter()
                .any(|r| r.get("controller").and_then(Value::as_bool) == Some(true))
        });
    if owned_by_controller {
        return true;
    }

    match kind.plural {
        "configmaps" => document.name() == Some(ROOT_CA_CONFIGMAP),
        "serviceaccounts" => document.name() == Some(DEFAULT_SERVICE_ACCOUNT),
        "secrets" => {
            value.get("type").and_then(Value::as_str) == Some(SERVICE_ACCOUNT_TOKEN_TYPE)
        }
        _ => false,
    }
}

/// Export CRDs, namespaces, built-in kinds and custom resources.
///
/// Per-collection failures are recorded as warnings; only staging I/O on the
/// root directory is fatal.
#[instrument(skip_all)]
pub async fn export(session: &MigrationSession, warnings: &mut WarningLog) -> Result<ExportSummary> {
    let source = session.source()?;
    let client = source.client();
    let dry_run = session.options.dry_run;

    if dry_run {
        info!("Dry run: nothing will be written to {}", session.staging.root().display());
    } else {
        session.staging.create()?;
        session.staging.clear(session.plan.as_slice())?;
        info!("Exporting from {} into {}", source, session.staging.root().display());
    }

    let mut summary = ExportSummary::default();

    let crds = if session.options.include_custom_resources {
        export_crds(session, client, &mut summary, warnings).await
    } else {
        Vec::new()
    };

    for namespace in session.plan.iter() {
        export_namespace(session, client, namespace, &crds, &mut summary, warnings).await;
    }

    info!(
        "Export finished: {} object(s) in {} collection(s)",
        summary.total_objects(),
        summary.collections.len()
    );
    Ok(summary)
}

async fn export_crds(
    session: &MigrationSession,
    client: &dyn ControlPlane,
    summary: &mut ExportSummary,
    warnings: &mut WarningLog,
) -> Vec<CrdInfo> {
    let documents = match client.list(&crd_resource(), None).await {
        Ok(documents) => documents,
        Err(e) => {
            warnings.push(Phase::Export, "crds", e);
            return Vec::new();
        }
    };
    if documents.is_empty() {
        info!("No custom resource definitions found");
        return Vec::new();
    }

    let mut crds = Vec::new();
    for document in &documents {
        match CrdInfo::from_document(document) {
            Ok(crd) => crds.push(crd),
            Err(e) => warnings.push(Phase::Export, document.display_name(), e),
        }
    }

    summary.record(None, "crds", documents.len(), false);
    write_collection(session, &session.staging.crds_path(), documents, warnings);
    crds
}

#[instrument(skip(session, client, crds, summary, warnings))]
async fn export_namespace(
    session: &MigrationSession,
    client: &dyn ControlPlane,
    namespace: &str,
    crds: &[CrdInfo],
    summary: &mut ExportSummary,
    warnings: &mut WarningLog,
) {
    match client.get(&namespace_resource(), None, namespace).await {
        Ok(Some(definition)) => {
            summary.namespaces.push(namespace.to_string());
            if !session.options.dry_run {
                let path = session.staging.namespace_path(namespace);
                if let Err(e) = session.staging.write(&path, &Manifest::Single(definition)) {
                    warnings.push(Phase::Export, namespace, e);
                }
            }
        }
        Ok(None) => {
            warnings.push(Phase::Export, namespace, "namespace does not exist on source");
            return;
        }
        Err(e) => {
            warnings.push(Phase::Export, namespace, e);
            return;
        }
    }

    for kind in &session.kinds {
        let subject = format!("{}/{}", namespace, kind);
        let documents = match client.list(&kind.api_resource(), Some(namespace)).await {
            Ok(documents) => documents,
            Err(e) => {
                warnings.push(Phase::Export, subject, e);
                continue;
            }
        };
        let documents: Vec<ResourceDocument> = documents
            .into_iter()
            .filter(|d| !is_control_plane_managed(kind, d))
            .collect();

        if documents.is_empty() {
            debug!("No {} found in {}", kind, namespace);
            continue;
        }
        summary.record(Some(namespace), kind.plural, documents.len(), false);
        write_collection(session, &session.staging.kind_path(namespace, kind), documents, warnings);
    }

    for crd in crds.iter().filter(|c| c.namespaced && !c.is_builtin()) {
        let subject = format!("{}/{}", namespace, crd.name);
        let documents = match client.list(&crd.api_resource(), Some(namespace)).await {
            Ok(documents) => documents,
            Err(e) => {
                warnings.push(Phase::Export, subject, e);
                continue;
            }
        };
        if documents.is_empty() {
            continue;
        }
        summary.record(Some(namespace), &crd.name, documents.len(), true);
        write_collection(
            session,
            &session.staging.custom_path(namespace, &crd.name),
            documents,
            warnings,
        );
    }
}

fn write_collection(
    session: &MigrationSession,
    path: &std::path::Path,
    documents: Vec<ResourceDocument>,
    warnings: &mut WarningLog,
) {
    if session.options.dry_run {
        info!("Would write {} document(s) to {}", documents.len(), path.display());
        return;
    }
    let manifest = Manifest::List(DocumentList::new(documents));
    match session.staging.write(path, &manifest) {
        Ok(()) => info!("Exported {} document(s) to {}", manifest.len(), path.display()),
        Err(e) => warnings.push(Phase::Export, path.display().to_string(), e),
    }
}
