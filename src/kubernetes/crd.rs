// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CustomResourceDefinition inspection

use kube::discovery::ApiResource;
use serde_json::Value;

use crate::constants::crd::BUILTIN_GROUP_SUFFIXES;
use crate::error::{ConvertError, Result};
use crate::types::kind::split_api_version;
use crate::types::ResourceDocument;

/// The parts of a CRD needed to find and re-create its instances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrdInfo {
    /// `<plural>.<group>`, also the staging file stem
    pub name: String,
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub namespaced: bool,
}

impl CrdInfo {
    pub fn from_document(document: &ResourceDocument) -> Result<Self> {
        let value = document.value();
        let field = |pointer: &str| -> Result<String> {
            value
                .pointer(pointer)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    ConvertError::InvalidManifest(format!(
                        "CRD {} is missing {}",
                        document.name().unwrap_or("<unnamed>"),
                        pointer
                    ))
                })
        };

        let name = field("/metadata/name")?;
        let group = field("/spec/group")?;
        let kind = field("/spec/names/kind")?;
        let plural = field("/spec/names/plural")?;
        let namespaced = field("/spec/scope")? == "Namespaced";
        let version = storage_version(value).ok_or_else(|| {
            ConvertError::InvalidManifest(format!("CRD {} has no served version", name))
        })?;

        Ok(Self {
            name,
            group,
            version,
            kind,
            plural,
            namespaced,
        })
    }

    /// Whether the group belongs to Kubernetes itself rather than an add-on
    pub fn is_builtin(&self) -> bool {
        is_builtin_group(&self.group)
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: format!("{}/{}", self.group, self.version),
            kind: self.kind.clone(),
            plural: self.plural.clone(),
        }
    }
}

/// Prefer the storage version, fall back to the first served one
fn storage_version(crd: &Value) -> Option<String> {
    let versions = crd.pointer("/spec/versions")?.as_array()?;
    let flagged = |flag: &str| {
        versions
            .iter()
            .find(|v| v.get(flag).and_then(Value::as_bool) == Some(true))
            .and_then(|v| v.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    flagged("storage").or_else(|| flagged("served"))
}

pub fn is_builtin_group(group: &str) -> bool {
    BUILTIN_GROUP_SUFFIXES
        .iter()
        .any(|suffix| group == *suffix || group.ends_with(&format!(".{}", suffix)))
}

/// Rebuild the API resource of a custom-resource staging file.
///
/// The file stem is the CRD name (`<plural>.<group>`); group and version come
/// from the document itself, so no CRD lookup on the target is needed.
pub fn custom_resource_api(crd_name: &str, document: &ResourceDocument) -> Result<ApiResource> {
    let (plural, _) = crd_name.split_once('.').ok_or_else(|| {
        ConvertError::InvalidManifest(format!("'{}' is not a CRD name", crd_name))
    })?;
    let api_version = document.api_version().ok_or_else(|| {
        ConvertError::InvalidManifest(format!("{} has no apiVersion", document.display_name()))
    })?;
    let kind = document.kind().ok_or_else(|| {
        ConvertError::InvalidManifest(format!("{} has no kind", document.display_name()))
    })?;
    let (group, version) = split_api_version(api_version);

    Ok(ApiResource {
        group: group.to_string(),
        version: version.to_string(),
        api_version: api_version.to_string(),
        kind: kind.to_string(),
        plural: plural.to_string(),
    })
}
