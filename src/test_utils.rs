// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a canned-response HTTP mock for the kube client and an
//! in-memory cluster for the migration phases.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use http::{Request, Response};
use kube::client::Body;
use kube::discovery::ApiResource;
use kube::Client;
use serde_json::{json, Value};
use tower::Service;

use crate::error::{ConvertError, Result};
use crate::kubernetes::{Connector, ControlPlane};
use crate::types::kind::{namespace_resource, pod_resource};
use crate::types::{ResourceDocument, ResourceKind};

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Add a response for PATCH requests matching the exact path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) = response.unwrap_or_else(|| (404, not_found_json("resource", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a mock namespace list JSON response
pub fn namespace_list_json(names: &[&str]) -> String {
    json!({
        "apiVersion": "v1",
        "kind": "NamespaceList",
        "metadata": {"resourceVersion": "1"},
        "items": names
            .iter()
            .map(|n| json!({"metadata": {"name": n, "uid": format!("uid-{}", n)}}))
            .collect::<Vec<_>>()
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// An object as the API server would return it, server-assigned fields included
pub fn server_object(kind: &ResourceKind, namespace: &str, name: &str) -> Value {
    json!({
        "apiVersion": kind.api_version(),
        "kind": kind.kind,
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("uid-{}-{}", namespace, name),
            "resourceVersion": "4242",
            "generation": 3,
            "creationTimestamp": "2026-01-01T00:00:00Z",
            "annotations": {
                "kubectl.kubernetes.io/last-applied-configuration": "{}"
            },
            "labels": {"app": name}
        },
        "spec": {},
        "status": {"observedGeneration": 3}
    })
}

fn resource_key(resource: &ApiResource) -> String {
    if resource.group.is_empty() {
        resource.plural.clone()
    } else {
        format!("{}.{}", resource.plural, resource.group)
    }
}

fn qualified_name(document: &ResourceDocument) -> String {
    match document.namespace() {
        Some(ns) => format!("{}/{}", ns, document.name().unwrap_or_default()),
        None => document.name().unwrap_or_default().to_string(),
    }
}

#[derive(Default)]
struct FakeState {
    objects: Vec<(String, ResourceDocument)>,
    mutations: Vec<String>,
    rejected_namespaces: HashSet<String>,
    rejected_applies: HashSet<String>,
    failing_lists: HashSet<String>,
    unreachable: bool,
}

/// In-memory control plane that records every mutation in order
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<FakeState>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, resource: &ApiResource, value: Value) -> Self {
        let doc = ResourceDocument::new(value).with_type(&resource.api_version, &resource.kind);
        self.state
            .lock()
            .unwrap()
            .objects
            .push((resource_key(resource), doc));
        self
    }

    pub fn with_namespace(self, name: &str) -> Self {
        self.with(
            &namespace_resource(),
            json!({
                "metadata": {"name": name, "uid": format!("uid-{}", name)},
                "spec": {"finalizers": ["kubernetes"]},
                "status": {"phase": "Active"}
            }),
        )
    }

    /// Add a built-in object carrying server-assigned metadata
    pub fn with_builtin(self, plural: &str, namespace: &str, name: &str) -> Self {
        let kind = ResourceKind::from_name(plural).unwrap();
        self.with(&kind.api_resource(), server_object(&kind, namespace, name))
    }

    pub fn with_pod(self, namespace: &str, name: &str, phase: &str) -> Self {
        self.with(
            &pod_resource(),
            json!({
                "metadata": {"name": name, "namespace": namespace},
                "status": {"phase": phase}
            }),
        )
    }

    pub fn reject_namespace(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .rejected_namespaces
            .insert(name.to_string());
        self
    }

    /// Fail every apply of the given plural resource name
    pub fn reject_apply(self, plural: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .rejected_applies
            .insert(plural.to_string());
        self
    }

    /// Fail every list of the given plural resource name
    pub fn fail_list(self, plural: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_lists
            .insert(plural.to_string());
        self
    }

    pub fn unreachable(self) -> Self {
        self.state.lock().unwrap().unreachable = true;
        self
    }

    /// Mutations in the order they happened, e.g. `apply deployments/app/web`
    pub fn mutations(&self) -> Vec<String> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.objects("namespaces", None)
            .iter()
            .filter_map(|d| d.name().map(str::to_string))
            .collect()
    }

    pub fn objects(&self, key: &str, namespace: Option<&str>) -> Vec<ResourceDocument> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .filter(|(k, d)| k == key && (namespace.is_none() || d.namespace() == namespace))
            .map(|(_, d)| d.clone())
            .collect()
    }

    fn reject(&self, message: String) -> ConvertError {
        ConvertError::InvalidManifest(format!("fake cluster rejected {}", message))
    }
}

#[async_trait]
impl ControlPlane for FakeCluster {
    async fn server_version(&self) -> Result<String> {
        if self.state.lock().unwrap().unreachable {
            return Err(ConvertError::Timeout {
                operation: "server version".to_string(),
                seconds: 1,
            });
        }
        Ok("v1.30.0".to_string())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>> {
        Ok(self.namespaces())
    }

    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ResourceDocument>> {
        Ok(self
            .objects(&resource_key(resource), namespace)
            .into_iter()
            .find(|d| d.name() == Some(name)))
    }

    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<ResourceDocument>> {
        if self
            .state
            .lock()
            .unwrap()
            .failing_lists
            .contains(&resource.plural)
        {
            return Err(self.reject(format!("list {}", resource.plural)));
        }
        Ok(self.objects(&resource_key(resource), namespace))
    }

    async fn create(&self, resource: &ApiResource, document: &ResourceDocument) -> Result<()> {
        let key = resource_key(resource);
        let name = qualified_name(document);
        let mut state = self.state.lock().unwrap();
        if resource.plural == "namespaces" && state.rejected_namespaces.contains(&name) {
            return Err(self.reject(format!("namespace {}", name)));
        }
        if state
            .objects
            .iter()
            .any(|(k, d)| *k == key && qualified_name(d) == name)
        {
            return Err(self.reject(format!("{}/{}: already exists", resource.plural, name)));
        }
        state.objects.push((key, document.clone()));
        state
            .mutations
            .push(format!("create {}/{}", resource.plural, name));
        Ok(())
    }

    async fn apply(&self, resource: &ApiResource, document: &ResourceDocument) -> Result<()> {
        let key = resource_key(resource);
        let name = qualified_name(document);
        let mut state = self.state.lock().unwrap();
        let rejected = state.rejected_applies.contains(&resource.plural)
            || (resource.plural == "namespaces" && state.rejected_namespaces.contains(&name));
        if rejected {
            return Err(self.reject(format!("{}/{}", resource.plural, name)));
        }
        state
            .objects
            .retain(|(k, d)| !(*k == key && qualified_name(d) == name));
        state.objects.push((key, document.clone()));
        state
            .mutations
            .push(format!("apply {}/{}", resource.plural, name));
        Ok(())
    }
}

/// Connector over a fixed set of in-memory clusters
#[derive(Default)]
pub struct FakeConnector {
    contexts: Vec<(String, Arc<FakeCluster>)>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, name: &str, cluster: Arc<FakeCluster>) -> Self {
        self.contexts.push((name.to_string(), cluster));
        self
    }
}

#[async_trait]
impl Connector for FakeConnector {
    fn kubeconfig_path(&self) -> Option<&Path> {
        None
    }

    async fn contexts(&self) -> Result<Vec<String>> {
        Ok(self.contexts.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn connect(&self, context: &str) -> Result<Arc<dyn ControlPlane>> {
        self.contexts
            .iter()
            .find(|(name, _)| name == context)
            .map(|(_, cluster)| cluster.clone() as Arc<dyn ControlPlane>)
            .ok_or_else(|| {
                ConvertError::KubeconfigError(format!("context {} not found", context))
            })
    }
}
