// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! On-disk staging layout shared by exporter, sanitizer, importer and verifier:
//!
//! ```text
//! <root>/crds.yaml
//! <root>/<namespace>/namespace.yaml
//! <root>/<namespace>/<kind>.yaml
//! <root>/<namespace>/custom-resources/<crd-name>.yaml
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::constants::staging::{
    BACKUP_SUFFIX, CRDS_FILE, CUSTOM_RESOURCES_DIR, NAMESPACE_FILE, YAML_EXTENSION,
};
use crate::error::{ConvertError, Result};
use crate::types::{Manifest, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingArea {
    root: PathBuf,
    /// The root was already on disk when the area was opened
    preexisting: bool,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let preexisting = root.is_dir();
        Self { root, preexisting }
    }

    pub fn preexisting(&self) -> bool {
        self.preexisting
    }

    /// Create the root directory if needed
    pub fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(ConvertError::staging(&self.root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn crds_path(&self) -> PathBuf {
        self.root.join(CRDS_FILE)
    }

    pub fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    pub fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.namespace_dir(namespace).join(NAMESPACE_FILE)
    }

    pub fn kind_path(&self, namespace: &str, kind: &ResourceKind) -> PathBuf {
        self.namespace_dir(namespace).join(kind.file_name())
    }

    pub fn custom_dir(&self, namespace: &str) -> PathBuf {
        self.namespace_dir(namespace).join(CUSTOM_RESOURCES_DIR)
    }

    pub fn custom_path(&self, namespace: &str, crd_name: &str) -> PathBuf {
        self.custom_dir(namespace)
            .join(format!("{}.{}", crd_name, YAML_EXTENSION))
    }

    /// Where a file is moved when it cannot be sanitized
    pub fn backup_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }

    pub fn write(&self, path: &Path, manifest: &Manifest) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConvertError::staging(parent))?;
        }
        let yaml = manifest.to_yaml()?;
        fs::write(path, yaml).map_err(ConvertError::staging(path))?;
        debug!("Wrote {} document(s) to {}", manifest.len(), path.display());
        Ok(())
    }

    /// Read a staging file, `None` when it does not exist
    pub fn read(path: &Path) -> Result<Option<Manifest>> {
        if !path.is_file() {
            return Ok(None);
        }
        let yaml = fs::read_to_string(path).map_err(ConvertError::staging(path))?;
        Manifest::parse(&yaml).map(Some)
    }

    /// Namespace subtrees present on disk, sorted by name
    pub fn namespaces(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(ConvertError::staging(&self.root))? {
            let entry = entry.map_err(ConvertError::staging(&self.root))?;
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Custom-resource files of a namespace as (crd name, path), sorted by name.
    /// Quarantined `.bak` files are not included.
    pub fn custom_resource_files(&self, namespace: &str) -> Result<Vec<(String, PathBuf)>> {
        self.custom_files(namespace, &format!(".{}", YAML_EXTENSION))
    }

    /// Quarantined custom-resource files of a namespace as (crd name, path)
    pub fn quarantined_custom_resource_files(
        &self,
        namespace: &str,
    ) -> Result<Vec<(String, PathBuf)>> {
        self.custom_files(namespace, &format!(".{}{}", YAML_EXTENSION, BACKUP_SUFFIX))
    }

    fn custom_files(&self, namespace: &str, suffix: &str) -> Result<Vec<(String, PathBuf)>> {
        let dir = self.custom_dir(namespace);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(ConvertError::staging(&dir))? {
            let path = entry.map_err(ConvertError::staging(&dir))?.path();
            let crd_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_suffix(suffix))
                .map(str::to_string);
            if let Some(crd_name) = crd_name {
                if path.is_file() {
                    files.push((crd_name, path));
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Every staged `.yaml` file, depth-first in sorted order
    pub fn manifest_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        collect_yaml(&self.root, &mut files)?;
        Ok(files)
    }

    /// Delete the CRD file and the given namespace subtrees left by an earlier export
    pub fn clear(&self, namespaces: &[String]) -> Result<()> {
        let crds = self.crds_path();
        for path in [Self::backup_path(&crds), crds] {
            if path.is_file() {
                fs::remove_file(&path).map_err(ConvertError::staging(&path))?;
            }
        }
        for namespace in namespaces {
            let dir = self.namespace_dir(namespace);
            if dir.is_dir() {
                debug!("Clearing stale staging subtree {}", dir.display());
                fs::remove_dir_all(&dir).map_err(ConvertError::staging(&dir))?;
            }
        }
        Ok(())
    }

    /// Remove what a run staged. A root the run created goes entirely,
    /// a pre-existing root keeps everything outside the staged layout.
    pub fn remove(&self, namespaces: &[String]) -> Result<()> {
        if self.preexisting {
            self.clear(namespaces)
        } else {
            fs::remove_dir_all(&self.root).map_err(ConvertError::staging(&self.root))
        }
    }
}

fn collect_yaml(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(ConvertError::staging(dir))? {
        entries.push(entry.map_err(ConvertError::staging(dir))?.path());
    }
    entries.sort();
    for path in entries {
        if path.is_dir() {
            collect_yaml(&path, files)?;
        } else if path.extension().is_some_and(|e| e == YAML_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocumentList, ResourceDocument};
    use serde_json::json;

    fn make_list(names: &[&str]) -> Manifest {
        Manifest::List(DocumentList::new(
            names
                .iter()
                .map(|n| ResourceDocument::new(json!({"kind": "ConfigMap", "metadata": {"name": n}})))
                .collect(),
        ))
    }

    #[test]
    fn test_layout_paths() {
        let staging = StagingArea::new("/stage");
        let deployments = ResourceKind::from_name("deployments").unwrap();
        assert_eq!(staging.crds_path(), PathBuf::from("/stage/crds.yaml"));
        assert_eq!(
            staging.namespace_path("app"),
            PathBuf::from("/stage/app/namespace.yaml")
        );
        assert_eq!(
            staging.kind_path("app", &deployments),
            PathBuf::from("/stage/app/deployments.yaml")
        );
        assert_eq!(
            staging.custom_path("app", "certificates.cert-manager.io"),
            PathBuf::from("/stage/app/custom-resources/certificates.cert-manager.io.yaml")
        );
        assert_eq!(
            StagingArea::backup_path(Path::new("/stage/app/secrets.yaml")),
            PathBuf::from("/stage/app/secrets.yaml.bak")
        );
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());
        let path = staging.kind_path("app", &ResourceKind::from_name("cm").unwrap());
        staging.write(&path, &make_list(&["a", "b"])).unwrap();
        let read = StagingArea::read(&path).unwrap().unwrap();
        assert_eq!(read.len(), 2);
        assert!(StagingArea::read(&dir.path().join("absent.yaml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_namespaces_lists_subtrees_only() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());
        staging.write(&staging.crds_path(), &make_list(&[])).unwrap();
        staging
            .write(&staging.namespace_path("web"), &make_list(&[]))
            .unwrap();
        staging
            .write(&staging.namespace_path("api"), &make_list(&[]))
            .unwrap();
        assert_eq!(staging.namespaces().unwrap(), vec!["api", "web"]);
    }

    #[test]
    fn test_custom_resource_files_skip_backups() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());
        let good = staging.custom_path("app", "issuers.cert-manager.io");
        let other = staging.custom_path("app", "certificates.cert-manager.io");
        staging.write(&good, &make_list(&["x"])).unwrap();
        staging.write(&other, &make_list(&["y"])).unwrap();
        fs::rename(&other, StagingArea::backup_path(&other)).unwrap();

        let files = staging.custom_resource_files("app").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "issuers.cert-manager.io");
        assert!(staging.custom_resource_files("other").unwrap().is_empty());

        let quarantined = staging.quarantined_custom_resource_files("app").unwrap();
        assert_eq!(quarantined.len(), 1);
        assert_eq!(quarantined[0].0, "certificates.cert-manager.io");
    }

    #[test]
    fn test_remove_keeps_foreign_files_in_preexisting_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "notes").unwrap();
        let staging = StagingArea::new(dir.path());
        assert!(staging.preexisting());
        staging.write(&staging.crds_path(), &make_list(&[])).unwrap();
        staging
            .write(&staging.namespace_path("app"), &make_list(&[]))
            .unwrap();

        staging.remove(&["app".to_string()]).unwrap();

        assert!(dir.path().join("keep.txt").is_file());
        assert!(!staging.crds_path().exists());
        assert!(!staging.namespace_dir("app").exists());
    }

    #[test]
    fn test_remove_deletes_root_it_created() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("stage");
        let staging = StagingArea::new(&root);
        assert!(!staging.preexisting());
        staging
            .write(&staging.namespace_path("app"), &make_list(&[]))
            .unwrap();

        staging.remove(&["app".to_string()]).unwrap();

        assert!(!root.exists());
    }

    #[test]
    fn test_clear_only_touches_given_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());
        let secrets = ResourceKind::from_name("secrets").unwrap();
        staging
            .write(&staging.kind_path("app", &secrets), &make_list(&["old"]))
            .unwrap();
        staging
            .write(&staging.kind_path("web", &secrets), &make_list(&["other"]))
            .unwrap();

        staging.clear(&["app".to_string()]).unwrap();

        assert!(!staging.kind_path("app", &secrets).exists());
        assert!(staging.kind_path("web", &secrets).is_file());
    }

    #[test]
    fn test_manifest_files_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());
        staging.write(&staging.crds_path(), &make_list(&[])).unwrap();
        staging
            .write(&staging.namespace_path("app"), &make_list(&[]))
            .unwrap();
        staging
            .write(&staging.custom_path("app", "a.example.com"), &make_list(&[]))
            .unwrap();
        assert_eq!(staging.manifest_files().unwrap().len(), 3);
    }
}
