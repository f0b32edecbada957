// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The cluster conversion pipeline: resolve, select, export, sanitize,
//! import, verify.

pub mod exporter;
pub mod importer;
pub mod orchestrator;
pub mod resolver;
pub mod sanitizer;
pub mod selector;
pub mod session;
pub mod staging;
pub mod verifier;

use std::fmt;

use tracing::warn;

pub use exporter::{export, ExportSummary};
pub use importer::{import, ImportSummary};
pub use orchestrator::{MigrationOrchestrator, MigrationOutcome};
pub use resolver::{resolve, EndpointRequest};
pub use sanitizer::{sanitize, SanitizeSummary};
pub use selector::{select, NamespacePlan, NamespaceSelection};
pub use session::{MigrationSession, SessionOptions};
pub use staging::StagingArea;
pub use verifier::verify;

/// Pipeline phases, used to label warnings and fatal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolve,
    Select,
    Export,
    Sanitize,
    Import,
    Verify,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Resolve => "resolve",
            Phase::Select => "select",
            Phase::Export => "export",
            Phase::Sanitize => "sanitize",
            Phase::Import => "import",
            Phase::Verify => "verify",
        };
        f.write_str(name)
    }
}

/// A non-fatal problem recorded during a phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub phase: Phase,
    pub subject: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.phase, self.subject, self.message)
    }
}

/// Warnings accumulated across the whole session
#[derive(Debug, Clone, Default)]
pub struct WarningLog {
    entries: Vec<Warning>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and record a warning
    pub fn push(&mut self, phase: Phase, subject: impl Into<String>, message: impl fmt::Display) {
        let warning = Warning {
            phase,
            subject: subject.into(),
            message: message.to_string(),
        };
        warn!(phase = %warning.phase, "{}: {}", warning.subject, warning.message);
        self.entries.push(warning);
    }

    pub fn entries(&self) -> &[Warning] {
        &self.entries
    }

    pub fn in_phase(&self, phase: Phase) -> impl Iterator<Item = &Warning> {
        self.entries.iter().filter(move |w| w.phase == phase)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
