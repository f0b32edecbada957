// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Post-import verification results. Informational only.

use std::fmt;

/// Expected vs observed instances of one kind in one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindCount {
    pub kind: String,
    pub expected: usize,
    /// `None` when the target could not be queried
    pub observed: Option<usize>,
}

impl KindCount {
    pub fn is_short(&self) -> bool {
        self.observed.is_some_and(|observed| observed < self.expected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PodReadiness {
    pub running: usize,
    pub total: usize,
}

impl PodReadiness {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.running as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceReport {
    pub namespace: String,
    pub exists: bool,
    pub counts: Vec<KindCount>,
    pub pods: Option<PodReadiness>,
    pub notes: Vec<String>,
}

impl NamespaceReport {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            exists: false,
            counts: Vec::new(),
            pods: None,
            notes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    pub namespaces: Vec<NamespaceReport>,
}

impl VerificationReport {
    /// Human readable warnings derived from the report
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for ns in &self.namespaces {
            if !ns.exists {
                warnings.push(format!("namespace {} does not exist on target", ns.namespace));
                continue;
            }
            for count in &ns.counts {
                match count.observed {
                    Some(observed) if observed < count.expected => warnings.push(format!(
                        "{}/{}: expected {}, found {}",
                        ns.namespace, count.kind, count.expected, observed
                    )),
                    None => warnings.push(format!(
                        "{}/{}: could not be counted on target",
                        ns.namespace, count.kind
                    )),
                    _ => {}
                }
            }
            warnings.extend(ns.notes.iter().map(|n| format!("{}: {}", ns.namespace, n)));
        }
        warnings
    }

    pub fn is_clean(&self) -> bool {
        self.warnings().is_empty()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ns in &self.namespaces {
            if !ns.exists {
                writeln!(f, "  {}: missing on target", ns.namespace)?;
                continue;
            }
            match ns.pods {
                Some(pods) => writeln!(
                    f,
                    "  {}: {}/{} pods running",
                    ns.namespace, pods.running, pods.total
                )?,
                None => writeln!(f, "  {}:", ns.namespace)?,
            }
            for count in &ns.counts {
                let observed = count
                    .observed
                    .map(|o| o.to_string())
                    .unwrap_or_else(|| "?".to_string());
                let marker = if count.is_short() || count.observed.is_none() {
                    " (!)"
                } else {
                    ""
                };
                writeln!(
                    f,
                    "    {:<28} {:>4} / {:<4}{}",
                    count.kind, observed, count.expected, marker
                )?;
            }
            for note in &ns.notes {
                writeln!(f, "    note: {}", note)?;
            }
        }
        Ok(())
    }
}
