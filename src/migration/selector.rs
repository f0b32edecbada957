// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace plan computation

use tracing::{debug, info, instrument};

use crate::constants::namespaces::DEFAULT_EXCLUDED;
use crate::error::{ConvertError, Result};
use crate::types::ClusterEndpoint;

/// What the operator asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSelection {
    pub include: Vec<String>,
    pub all: bool,
    pub exclude: Vec<String>,
}

impl NamespaceSelection {
    pub fn new(include: Vec<String>, all: bool) -> Self {
        Self {
            include,
            all,
            exclude: default_excluded(),
        }
    }

    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Filter candidates in place: drop excluded names and duplicates, keep order
    pub fn filter(&self, candidates: Vec<String>) -> Vec<String> {
        let mut kept: Vec<String> = Vec::with_capacity(candidates.len());
        for ns in candidates {
            if self.exclude.contains(&ns) {
                debug!("Excluding namespace {}", ns);
            } else if !kept.contains(&ns) {
                kept.push(ns);
            }
        }
        kept
    }
}

pub fn default_excluded() -> Vec<String> {
    DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect()
}

/// Ordered, non-empty set of namespaces to migrate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePlan {
    namespaces: Vec<String>,
}

impl NamespacePlan {
    pub fn new(namespaces: Vec<String>) -> Result<Self> {
        if namespaces.is_empty() {
            return Err(ConvertError::NoNamespaces);
        }
        Ok(Self { namespaces })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.namespaces
    }
}

/// Compute the namespace plan from the selection and the source cluster
#[instrument(skip_all, fields(source = %source.context))]
pub async fn select(selection: &NamespaceSelection, source: &ClusterEndpoint) -> Result<NamespacePlan> {
    let candidates = if selection.all {
        source.client().list_namespaces().await?
    } else {
        selection.include.clone()
    };

    let plan = NamespacePlan::new(selection.filter(candidates))?;
    info!(
        "Selected {} namespace(s): {}",
        plan.len(),
        plan.as_slice().join(", ")
    );
    Ok(plan)
}
