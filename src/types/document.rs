// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Untyped manifests as they are staged between export and import.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConvertError, Result};

/// Where a document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Cluster,
    Namespaced(String),
}

/// A single raw Kubernetes object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceDocument {
    value: Value,
}

impl ResourceDocument {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn kind(&self) -> Option<&str> {
        self.value.get("kind").and_then(Value::as_str)
    }

    pub fn api_version(&self) -> Option<&str> {
        self.value.get("apiVersion").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.value.pointer("/metadata/name").and_then(Value::as_str)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.value
            .pointer("/metadata/namespace")
            .and_then(Value::as_str)
    }

    pub fn scope(&self) -> Scope {
        match self.namespace() {
            Some(ns) => Scope::Namespaced(ns.to_string()),
            None => Scope::Cluster,
        }
    }

    /// Human readable `kind/name` for logs
    pub fn display_name(&self) -> String {
        format!(
            "{}/{}",
            self.kind().unwrap_or("<unknown>"),
            self.name().unwrap_or("<unnamed>")
        )
    }

    /// Fill in apiVersion and kind when the API omitted them (list items)
    pub fn with_type(mut self, api_version: &str, kind: &str) -> Self {
        if let Some(map) = self.value.as_object_mut() {
            map.entry("apiVersion")
                .or_insert_with(|| Value::String(api_version.to_string()));
            map.entry("kind")
                .or_insert_with(|| Value::String(kind.to_string()));
        }
        self
    }

    /// Pin the document to a namespace
    pub fn set_namespace(&mut self, namespace: &str) {
        if let Some(meta) = self
            .value
            .get_mut("metadata")
            .and_then(Value::as_object_mut)
        {
            meta.insert(
                "namespace".to_string(),
                Value::String(namespace.to_string()),
            );
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }
}

/// A `kind: List` collection, the shape every per-kind staging file uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentList {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub items: Vec<ResourceDocument>,
}

impl DocumentList {
    pub fn new(items: Vec<ResourceDocument>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "List".to_string(),
            items,
        }
    }
}

/// Contents of one staging file
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    List(DocumentList),
    Single(ResourceDocument),
}

impl Manifest {
    pub fn parse(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml)?;
        if !value.is_object() {
            return Err(ConvertError::InvalidManifest(
                "expected a mapping at the document root".to_string(),
            ));
        }
        if value.get("kind").and_then(Value::as_str) == Some("List") {
            Ok(Manifest::List(serde_json::from_value(value)?))
        } else {
            Ok(Manifest::Single(ResourceDocument::new(value)))
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        let yaml = match self {
            Manifest::List(list) => serde_yaml::to_string(list)?,
            Manifest::Single(doc) => serde_yaml::to_string(doc)?,
        };
        Ok(yaml)
    }

    pub fn documents(&self) -> &[ResourceDocument] {
        match self {
            Manifest::List(list) => &list.items,
            Manifest::Single(doc) => std::slice::from_ref(doc),
        }
    }

    pub fn documents_mut(&mut self) -> &mut [ResourceDocument] {
        match self {
            Manifest::List(list) => &mut list.items,
            Manifest::Single(doc) => std::slice::from_mut(doc),
        }
    }

    pub fn len(&self) -> usize {
        self.documents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents().is_empty()
    }
}
