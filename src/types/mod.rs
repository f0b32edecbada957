// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Domain types shared by the migration phases.

pub mod document;
pub mod endpoint;
pub mod kind;
pub mod provider;
pub mod report;

pub use document::{DocumentList, Manifest, ResourceDocument, Scope};
pub use endpoint::{ClusterEndpoint, Credential};
pub use kind::{KindCategory, ResourceKind};
pub use provider::Provider;
pub use report::{KindCount, NamespaceReport, PodReadiness, VerificationReport};
