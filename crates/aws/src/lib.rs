//! `SsoAdmin` over the AWS SDK. Credentials come from the default provider chain.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_ssoadmin::error::{DisplayErrorContext, SdkError};
use aws_sdk_ssoadmin::primitives::DateTimeFormat;
use aws_sdk_ssoadmin::Client;
use psexport_core::{
    CustomerManagedPolicyReference, FetchError, ManagedPolicy, PermissionSet, PermissionsBoundary, SsoAdmin, Tag,
};
use tracing::debug;

pub async fn load_sdk_config(region: Option<String>, profile: Option<String>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(r) = region { loader = loader.region(Region::new(r)); }
    if let Some(p) = profile { loader = loader.profile_name(p); }
    loader.load().await
}

pub struct SsoAdminClient { client: Client }

impl SsoAdminClient {
    pub fn new(config: &SdkConfig) -> Self { Self { client: Client::new(config) } }
}

fn fatal<E, R>(err: SdkError<E, R>, what: &str) -> anyhow::Error
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    anyhow!("{what}: {}", DisplayErrorContext(&err))
}

/// Maps an SDK error onto the typed not-found / other split.
fn classify<E, R>(err: SdkError<E, R>, not_found: impl FnOnce(&E) -> bool) -> FetchError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match err.as_service_error() {
        Some(e) if not_found(e) => FetchError::NotFound(message),
        _ => FetchError::Other(message),
    }
}

#[async_trait]
impl SsoAdmin for SsoAdminClient {
    async fn first_instance_arn(&self) -> Result<String> {
        let out = self.client.list_instances().send().await.map_err(|e| fatal(e, "ListInstances"))?;
        let arn = out.instances().first()
            .and_then(|i| i.instance_arn())
            .context("no Identity Center instance found for this account")?;
        Ok(arn.to_string())
    }

    async fn list_permission_set_arns(&self, instance_arn: &str) -> Result<Vec<String>> {
        let mut pages = self.client.list_permission_sets()
            .instance_arn(instance_arn)
            .into_paginator()
            .send();
        let mut arns = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| fatal(e, "ListPermissionSets"))?;
            debug!(count = page.permission_sets().len(), "permission set page");
            arns.extend(page.permission_sets().iter().cloned());
        }
        Ok(arns)
    }

    async fn describe_permission_set(&self, instance_arn: &str, permission_set_arn: &str) -> Result<PermissionSet> {
        let out = self.client.describe_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .send().await
            .map_err(|e| fatal(e, "DescribePermissionSet"))?;
        let ps = out.permission_set().context("DescribePermissionSet returned no permission set")?;
        let name = ps.name().context("permission set has no name")?;
        Ok(PermissionSet {
            name: name.to_string(),
            description: ps.description().map(str::to_string),
            permission_set_arn: ps.permission_set_arn().unwrap_or(permission_set_arn).to_string(),
            created_date: ps.created_date().and_then(|d| d.fmt(DateTimeFormat::DateTime).ok()),
            session_duration: ps.session_duration().map(str::to_string),
            relay_state: ps.relay_state().map(str::to_string),
        })
    }

    async fn inline_policy(&self, instance_arn: &str, permission_set_arn: &str) -> Result<Option<String>, FetchError> {
        let out = self.client.get_inline_policy_for_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .send().await
            .map_err(|e| classify(e, |e| e.is_resource_not_found_exception()))?;
        Ok(out.inline_policy().map(str::to_string))
    }

    async fn permissions_boundary(&self, instance_arn: &str, permission_set_arn: &str) -> Result<Option<PermissionsBoundary>, FetchError> {
        let out = self.client.get_permissions_boundary_for_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .send().await
            .map_err(|e| classify(e, |e| e.is_resource_not_found_exception()))?;
        Ok(out.permissions_boundary().map(|b| PermissionsBoundary {
            customer_managed_policy_reference: b.customer_managed_policy_reference().map(|r| CustomerManagedPolicyReference {
                name: r.name().to_string(),
                path: r.path().map(str::to_string),
            }),
            managed_policy_arn: b.managed_policy_arn().map(str::to_string),
        }))
    }

    async fn managed_policies(&self, instance_arn: &str, permission_set_arn: &str) -> Result<Vec<ManagedPolicy>, FetchError> {
        // first page only
        let out = self.client.list_managed_policies_in_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .send().await
            .map_err(|e| classify(e, |e| e.is_resource_not_found_exception()))?;
        Ok(out.attached_managed_policies().iter().map(|p| ManagedPolicy {
            name: p.name().map(str::to_string),
            arn: p.arn().map(str::to_string),
        }).collect())
    }

    async fn tags(&self, instance_arn: &str, resource_arn: &str) -> Result<Vec<Tag>, FetchError> {
        let out = self.client.list_tags_for_resource()
            .instance_arn(instance_arn)
            .resource_arn(resource_arn)
            .send().await
            .map_err(|e| classify(e, |e| e.is_resource_not_found_exception()))?;
        Ok(out.tags().iter().map(|t| Tag { key: t.key().to_string(), value: t.value().to_string() }).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ssoadmin::operation::get_inline_policy_for_permission_set::GetInlinePolicyForPermissionSetError;
    use aws_sdk_ssoadmin::types::error::{ResourceNotFoundException, ThrottlingException};

    #[test]
    fn resource_not_found_is_typed() {
        let err: SdkError<GetInlinePolicyForPermissionSetError, ()> = SdkError::service_error(
            GetInlinePolicyForPermissionSetError::ResourceNotFoundException(
                ResourceNotFoundException::builder().message("no inline policy").build(),
            ),
            (),
        );
        let fe = classify(err, |e| e.is_resource_not_found_exception());
        assert!(fe.is_not_found());
    }

    #[test]
    fn other_service_errors_are_other() {
        let err: SdkError<GetInlinePolicyForPermissionSetError, ()> = SdkError::service_error(
            GetInlinePolicyForPermissionSetError::ThrottlingException(
                ThrottlingException::builder().message("rate exceeded").build(),
            ),
            (),
        );
        match classify(err, |e| e.is_resource_not_found_exception()) {
            FetchError::Other(msg) => assert!(msg.contains("rate exceeded"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn transport_errors_are_other() {
        let err: SdkError<GetInlinePolicyForPermissionSetError, ()> = SdkError::construction_failure("bad input");
        assert!(!classify(err, |e| e.is_resource_not_found_exception()).is_not_found());
    }

    #[tokio::test]
    async fn explicit_region_is_used() {
        let cfg = load_sdk_config(Some("eu-west-1".into()), None).await;
        assert_eq!(cfg.region().map(|r| r.as_ref()), Some("eu-west-1"));
    }
}
