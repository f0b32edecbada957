// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Control-plane access bound to a single cluster context

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use kube::{
    api::{DynamicObject, ListParams, Patch, PatchParams, PostParams},
    discovery::ApiResource,
    Api, Client, ResourceExt,
};
use tracing::{debug, instrument};

use crate::constants::FIELD_MANAGER;
use crate::error::{ConvertError, Result};
use crate::types::kind::namespace_resource;
use crate::types::ResourceDocument;

/// Operations the migration needs from one cluster.
///
/// Implementations are bound to exactly one endpoint; there is no shared
/// "current context".
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Lightweight connectivity probe, returns the server version
    async fn server_version(&self) -> Result<String>;

    /// Namespace names in server order
    async fn list_namespaces(&self) -> Result<Vec<String>>;

    /// Fetch one object, `None` if it does not exist
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ResourceDocument>>;

    /// List objects of a resource type, cluster-wide when `namespace` is `None`
    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<ResourceDocument>>;

    /// Create an object, failing if it already exists
    async fn create(&self, resource: &ApiResource, document: &ResourceDocument) -> Result<()>;

    /// Create or update an object (server-side apply)
    async fn apply(&self, resource: &ApiResource, document: &ResourceDocument) -> Result<()>;
}

/// `ControlPlane` backed by a kube `Client` built for an explicit context
#[derive(Clone)]
pub struct KubeControlPlane {
    client: Client,
    timeout: Duration,
}

impl KubeControlPlane {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn api(&self, resource: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
            None => Api::all_with(self.client.clone(), resource),
        }
    }

    /// Bound a call by the session timeout
    async fn bounded<T, F>(&self, operation: impl Into<String>, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, kube::Error>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(ConvertError::from),
            Err(_) => Err(ConvertError::Timeout {
                operation: operation.into(),
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

fn to_document(object: DynamicObject, resource: &ApiResource) -> Result<ResourceDocument> {
    let value = serde_json::to_value(&object)?;
    Ok(ResourceDocument::new(value).with_type(&resource.api_version, &resource.kind))
}

fn to_object(document: &ResourceDocument) -> Result<(String, DynamicObject)> {
    let name = document
        .name()
        .ok_or_else(|| ConvertError::InvalidManifest("document has no metadata.name".to_string()))?
        .to_string();
    let object: DynamicObject = serde_json::from_value(document.value().clone())?;
    Ok((name, object))
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    async fn server_version(&self) -> Result<String> {
        let info = self
            .bounded("server version", self.client.apiserver_version())
            .await?;
        Ok(info.git_version)
    }

    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let api = self.api(&namespace_resource(), None);
        let list = self
            .bounded("list namespaces", api.list(&ListParams::default()))
            .await?;
        Ok(list.items.iter().map(|ns| ns.name_any()).collect())
    }

    #[instrument(skip(self, resource), fields(resource = %resource.plural))]
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ResourceDocument>> {
        let api = self.api(resource, namespace);
        let object = self
            .bounded(format!("get {}/{}", resource.plural, name), api.get_opt(name))
            .await?;
        object.map(|o| to_document(o, resource)).transpose()
    }

    #[instrument(skip(self, resource), fields(resource = %resource.plural))]
    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<ResourceDocument>> {
        let api = self.api(resource, namespace);
        let list = self
            .bounded(
                format!("list {}", resource.plural),
                api.list(&ListParams::default()),
            )
            .await?;
        debug!("Listed {} {}", list.items.len(), resource.plural);
        list.items
            .into_iter()
            .map(|o| to_document(o, resource))
            .collect()
    }

    async fn create(&self, resource: &ApiResource, document: &ResourceDocument) -> Result<()> {
        let (name, object) = to_object(document)?;
        let api = self.api(resource, document.namespace());
        self.bounded(
            format!("create {}/{}", resource.plural, name),
            api.create(&PostParams::default(), &object),
        )
        .await?;
        Ok(())
    }

    async fn apply(&self, resource: &ApiResource, document: &ResourceDocument) -> Result<()> {
        let (name, _) = to_object(document)?;
        let api = self.api(resource, document.namespace());
        let pp = PatchParams::apply(FIELD_MANAGER).force();
        self.bounded(
            format!("apply {}/{}", resource.plural, name),
            api.patch(&name, &pp, &Patch::Apply(document.value())),
        )
        .await?;
        Ok(())
    }
}
