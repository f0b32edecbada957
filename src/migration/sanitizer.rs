// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Structural removal of server-assigned fields from staged manifests.
//!
//! Fields are addressed by key path, never by text pattern, so a document is
//! only ever touched where the denylist says so and a second pass is a no-op.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::constants::annotations::LAST_APPLIED;
use crate::error::{ConvertError, Result};
use crate::migration::{Phase, StagingArea, WarningLog};
use crate::types::{Manifest, ResourceDocument};

type FieldPath = &'static [&'static str];

/// Removed from every document
const COMMON_FIELDS: &[FieldPath] = &[
    &["metadata", "creationTimestamp"],
    &["metadata", "uid"],
    &["metadata", "resourceVersion"],
    &["metadata", "generation"],
    &["metadata", "managedFields"],
    &["metadata", "selfLink"],
    &["metadata", "annotations", LAST_APPLIED],
    &["status"],
];

const NAMESPACE_FIELDS: &[FieldPath] = &[&["spec", "finalizers"]];

const SERVICE_FIELDS: &[FieldPath] = &[&["spec", "clusterIP"], &["spec", "clusterIPs"]];

const PVC_FIELDS: &[FieldPath] = &[
    &["spec", "volumeName"],
    &["metadata", "annotations", "pv.kubernetes.io/bind-completed"],
    &["metadata", "annotations", "pv.kubernetes.io/bound-by-controller"],
    &["metadata", "annotations", "volume.beta.kubernetes.io/storage-provisioner"],
    &["metadata", "annotations", "volume.kubernetes.io/storage-provisioner"],
    &["metadata", "annotations", "volume.kubernetes.io/selected-node"],
];

const WORKLOAD_FIELDS: &[FieldPath] = &[&["spec", "template", "metadata", "creationTimestamp"]];

const JOB_FIELDS: &[FieldPath] = &[
    &["spec", "selector"],
    &["spec", "template", "metadata", "creationTimestamp"],
    &["spec", "template", "metadata", "labels", "controller-uid"],
    &["spec", "template", "metadata", "labels", "batch.kubernetes.io/controller-uid"],
];

const CRONJOB_FIELDS: &[FieldPath] = &[
    &["spec", "jobTemplate", "metadata", "creationTimestamp"],
    &["spec", "jobTemplate", "spec", "template", "metadata", "creationTimestamp"],
];

/// Maps that are dropped once removal leaves them empty
const PRUNABLE: &[&str] = &["annotations", "labels"];

fn kind_fields(kind: &str) -> &'static [FieldPath] {
    match kind {
        "Namespace" => NAMESPACE_FIELDS,
        "Service" => SERVICE_FIELDS,
        "PersistentVolumeClaim" => PVC_FIELDS,
        "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet" => WORKLOAD_FIELDS,
        "Job" => JOB_FIELDS,
        "CronJob" => CRONJOB_FIELDS,
        _ => &[],
    }
}

/// `clusterIP: None` asks for a headless service and must survive the move
fn is_headless(document: &ResourceDocument) -> bool {
    let spec = &document.value()["spec"];
    spec["clusterIP"].as_str() == Some("None")
        || spec["clusterIPs"]
            .as_array()
            .is_some_and(|ips| ips.first().and_then(Value::as_str) == Some("None"))
}

/// Remove the value at `path`, returns whether something was removed
fn remove_path(value: &mut Value, path: &[&str]) -> bool {
    let Some((first, rest)) = path.split_first() else {
        return false;
    };
    let Some(map) = value.as_object_mut() else {
        return false;
    };
    if rest.is_empty() {
        return map.remove(*first).is_some();
    }
    let Some(child) = map.get_mut(*first) else {
        return false;
    };
    let removed = remove_path(child, rest);
    if removed && PRUNABLE.contains(first) && child.as_object().is_some_and(|m| m.is_empty()) {
        map.remove(*first);
    }
    removed
}

/// Strip server-assigned fields from one document, returns the number removed
pub fn sanitize_document(document: &mut ResourceDocument) -> usize {
    let kind = document.kind().unwrap_or_default().to_string();
    let fields: &[FieldPath] = if kind == "Service" && is_headless(document) {
        &[]
    } else {
        kind_fields(&kind)
    };
    COMMON_FIELDS
        .iter()
        .chain(fields)
        .filter(|path| remove_path(document.value_mut(), path))
        .count()
}

/// Per-run statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeSummary {
    pub files: usize,
    pub documents: usize,
    pub fields_removed: usize,
    /// Files renamed to `.bak` and excluded from import
    pub quarantined: Vec<PathBuf>,
}

fn sanitize_file(path: &Path) -> Result<(usize, usize)> {
    let mut manifest = StagingArea::read(path)?.ok_or_else(|| ConvertError::Staging {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "file disappeared"),
    })?;
    let removed: usize = manifest
        .documents_mut()
        .iter_mut()
        .map(sanitize_document)
        .sum();
    let documents = manifest.len();
    if removed > 0 {
        write_manifest(path, &manifest)?;
    }
    Ok((documents, removed))
}

fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    fs::write(path, manifest.to_yaml()?).map_err(ConvertError::staging(path))
}

/// Sanitize every staged file in place.
///
/// A file that cannot be parsed or rewritten is moved to `<file>.bak` and a
/// warning is recorded; it is not imported afterwards.
#[instrument(skip_all, fields(root = %staging.root().display()))]
pub fn sanitize(staging: &StagingArea, warnings: &mut WarningLog) -> Result<SanitizeSummary> {
    let mut summary = SanitizeSummary::default();
    if !staging.exists() {
        debug!("Staging area does not exist, nothing to sanitize");
        return Ok(summary);
    }

    for path in staging.manifest_files()? {
        match sanitize_file(&path) {
            Ok((documents, removed)) => {
                debug!("Sanitized {}: {} field(s) removed", path.display(), removed);
                summary.files += 1;
                summary.documents += documents;
                summary.fields_removed += removed;
            }
            Err(e) => {
                let backup = StagingArea::backup_path(&path);
                let subject = path.display().to_string();
                match fs::rename(&path, &backup) {
                    Ok(()) => warnings.push(
                        Phase::Sanitize,
                        subject,
                        format!("{}; kept as {} and excluded from import", e, backup.display()),
                    ),
                    Err(rename) => warnings.push(
                        Phase::Sanitize,
                        subject,
                        format!("{}; could not move aside: {}", e, rename),
                    ),
                }
                summary.quarantined.push(backup);
            }
        }
    }

    info!(
        "Sanitized {} document(s) in {} file(s), {} quarantined",
        summary.documents,
        summary.files,
        summary.quarantined.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::server_object;
    use crate::types::{DocumentList, ResourceKind};
    use serde_json::json;

    fn make_document(plural: &str, name: &str) -> ResourceDocument {
        ResourceDocument::new(server_object(
            &ResourceKind::from_name(plural).unwrap(),
            "app",
            name,
        ))
    }

    #[test]
    fn test_common_fields_removed() {
        let mut doc = make_document("configmaps", "settings");
        sanitize_document(&mut doc);
        let meta = doc.value().get("metadata").unwrap();
        assert!(meta.get("uid").is_none());
        assert!(meta.get("resourceVersion").is_none());
        assert!(meta.get("generation").is_none());
        assert!(meta.get("creationTimestamp").is_none());
        assert!(meta.get("annotations").is_none());
        assert!(doc.value().get("status").is_none());
        assert_eq!(meta["labels"]["app"], "settings");
        assert_eq!(doc.namespace(), Some("app"));
    }

    #[test]
    fn test_other_annotations_survive() {
        let mut doc = ResourceDocument::new(json!({
            "kind": "ConfigMap",
            "metadata": {
                "name": "settings",
                "annotations": {
                    "kubectl.kubernetes.io/last-applied-configuration": "{}",
                    "team": "payments"
                }
            }
        }));
        sanitize_document(&mut doc);
        assert_eq!(
            doc.value()["metadata"]["annotations"],
            json!({"team": "payments"})
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let mut doc = make_document("services", "web");
        doc.value_mut()["spec"] = json!({"clusterIP": "10.0.0.12", "clusterIPs": ["10.0.0.12"], "ports": [{"port": 80}]});
        assert!(sanitize_document(&mut doc) > 0);
        let once = doc.clone();
        assert_eq!(sanitize_document(&mut doc), 0);
        assert_eq!(doc, once);
        assert_eq!(doc.value()["spec"], json!({"ports": [{"port": 80}]}));
    }

    #[test]
    fn test_headless_service_keeps_cluster_ip() {
        let mut doc = make_document("services", "postgres");
        doc.value_mut()["spec"] = json!({"clusterIP": "None", "clusterIPs": ["None"], "ports": [{"port": 5432}]});
        sanitize_document(&mut doc);
        assert_eq!(
            doc.value()["spec"],
            json!({"clusterIP": "None", "clusterIPs": ["None"], "ports": [{"port": 5432}]})
        );
        assert!(doc.value()["metadata"].get("uid").is_none());
    }

    #[test]
    fn test_namespace_finalizers_removed() {
        let mut doc = ResourceDocument::new(json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": {"name": "app", "uid": "x"},
            "spec": {"finalizers": ["kubernetes"]},
            "status": {"phase": "Active"}
        }));
        sanitize_document(&mut doc);
        assert_eq!(
            doc.value(),
            &json!({"apiVersion": "v1", "kind": "Namespace", "metadata": {"name": "app"}, "spec": {}})
        );
    }

    #[test]
    fn test_pvc_binding_removed() {
        let mut doc = ResourceDocument::new(json!({
            "kind": "PersistentVolumeClaim",
            "metadata": {
                "name": "data",
                "annotations": {
                    "pv.kubernetes.io/bind-completed": "yes",
                    "volume.kubernetes.io/selected-node": "node-1"
                }
            },
            "spec": {"volumeName": "pvc-123", "storageClassName": "standard"}
        }));
        sanitize_document(&mut doc);
        assert!(doc.value()["metadata"].get("annotations").is_none());
        assert_eq!(doc.value()["spec"], json!({"storageClassName": "standard"}));
    }

    #[test]
    fn test_job_selector_and_controller_labels_removed() {
        let mut doc = ResourceDocument::new(json!({
            "kind": "Job",
            "metadata": {"name": "migrate"},
            "spec": {
                "selector": {"matchLabels": {"controller-uid": "abc"}},
                "template": {
                    "metadata": {"labels": {"controller-uid": "abc", "job-name": "migrate"}},
                    "spec": {"restartPolicy": "Never"}
                }
            }
        }));
        sanitize_document(&mut doc);
        assert!(doc.value()["spec"].get("selector").is_none());
        assert_eq!(
            doc.value()["spec"]["template"]["metadata"]["labels"],
            json!({"job-name": "migrate"})
        );
    }

    #[test]
    fn test_sanitize_rewrites_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());
        let kind = ResourceKind::from_name("deployments").unwrap();
        let path = staging.kind_path("app", &kind);
        let list = Manifest::List(DocumentList::new(vec![
            make_document("deployments", "web"),
            make_document("deployments", "worker"),
        ]));
        staging.write(&path, &list).unwrap();

        let mut warnings = WarningLog::new();
        let summary = sanitize(&staging, &mut warnings).unwrap();
        assert_eq!(summary.files, 1);
        assert_eq!(summary.documents, 2);
        assert!(warnings.is_empty());

        let staged = StagingArea::read(&path).unwrap().unwrap();
        assert!(staged.documents().iter().all(|d| d.value().get("status").is_none()));

        let again = sanitize(&staging, &mut warnings).unwrap();
        assert_eq!(again.fields_removed, 0);
    }

    #[test]
    fn test_unparseable_file_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());
        let kind = ResourceKind::from_name("secrets").unwrap();
        let path = staging.kind_path("app", &kind);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "items: [unterminated").unwrap();

        let mut warnings = WarningLog::new();
        let summary = sanitize(&staging, &mut warnings).unwrap();

        assert!(!path.exists());
        assert!(StagingArea::backup_path(&path).is_file());
        assert_eq!(summary.quarantined, vec![StagingArea::backup_path(&path)]);
        assert_eq!(warnings.in_phase(Phase::Sanitize).count(), 1);
        assert!(staging.manifest_files().unwrap().is_empty());
    }

    #[test]
    fn test_missing_staging_area_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path().join("absent"));
        let summary = sanitize(&staging, &mut WarningLog::new()).unwrap();
        assert_eq!(summary, SanitizeSummary::default());
    }
}
