// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation, CRD inspection, and namespace management.

pub mod client;
pub mod control_plane;
pub mod crd;
pub mod namespaces;

pub use client::{Connector, KubeconfigConnector};
pub use control_plane::{ControlPlane, KubeControlPlane};
pub use crd::CrdInfo;
pub use namespaces::ensure_namespace_exists;
