use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

mod export;
pub use export::{Artifact, ArtifactFailure, ExportReport, ExportedPermissionSet, Exporter};

/// Permission Set details as returned by `DescribePermissionSet`; serialized as `metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionSet {
    pub name: String,
    pub description: Option<String>,
    pub permission_set_arn: String,
    /// ISO-8601.
    pub created_date: Option<String>,
    pub session_duration: Option<String>,
    pub relay_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerManagedPolicyReference {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionsBoundary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_managed_policy_reference: Option<CustomerManagedPolicyReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_policy_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag { pub key: String, pub value: String }

/// Outcome of an optional per-artifact fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The service says the resource does not exist.
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool { matches!(self, FetchError::NotFound(_)) }
}

/// The slice of the SSO Admin API an export needs.
///
/// The first three calls must succeed for the run to continue; the rest may fail per artifact.
#[async_trait]
pub trait SsoAdmin: Send + Sync {
    async fn first_instance_arn(&self) -> anyhow::Result<String>;
    async fn list_permission_set_arns(&self, instance_arn: &str) -> anyhow::Result<Vec<String>>;
    async fn describe_permission_set(&self, instance_arn: &str, permission_set_arn: &str) -> anyhow::Result<PermissionSet>;

    async fn inline_policy(&self, instance_arn: &str, permission_set_arn: &str) -> Result<Option<String>, FetchError>;
    async fn permissions_boundary(&self, instance_arn: &str, permission_set_arn: &str) -> Result<Option<PermissionsBoundary>, FetchError>;
    async fn managed_policies(&self, instance_arn: &str, permission_set_arn: &str) -> Result<Vec<ManagedPolicy>, FetchError>;
    async fn tags(&self, instance_arn: &str, resource_arn: &str) -> Result<Vec<Tag>, FetchError>;
}
