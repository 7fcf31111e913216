use anyhow::{Context, Result};
use psexport_filter::NameFilter;
use psexport_output as out;
use serde_json::Value as Json;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::{FetchError, SsoAdmin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact { Metadata, InlinePolicy, Boundary, ManagedPolicies, Tags }

impl Artifact {
    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::Metadata => out::METADATA_FILE,
            Artifact::InlinePolicy => out::INLINE_POLICY_FILE,
            Artifact::Boundary => out::BOUNDARY_FILE,
            Artifact::ManagedPolicies => out::MANAGED_POLICIES_FILE,
            Artifact::Tags => out::TAGS_FILE,
        }
    }

    /// Wording used in console and log lines.
    pub fn label(self) -> &'static str {
        match self {
            Artifact::Metadata => "metadata",
            Artifact::InlinePolicy => "inline policy",
            Artifact::Boundary => "boundary",
            Artifact::ManagedPolicies => "managed policies",
            Artifact::Tags => "tags",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFailure {
    pub permission_set: String,
    pub artifact: Artifact,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPermissionSet {
    pub name: String,
    pub dir: PathBuf,
    pub written: Vec<Artifact>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub instance_arn: String,
    pub exported: Vec<ExportedPermissionSet>,
    /// Names the filter excluded.
    pub skipped: Vec<String>,
    /// Names that cannot be used as a directory.
    pub rejected: Vec<String>,
    pub failures: Vec<ArtifactFailure>,
}

/// Sequential, read-only export of every Permission Set of the first Identity Center instance.
pub struct Exporter<C> {
    client: C,
    out_root: PathBuf,
}

impl<C: SsoAdmin> Exporter<C> {
    pub fn new(client: C, out_root: impl Into<PathBuf>) -> Self {
        Self { client, out_root: out_root.into() }
    }

    pub fn client(&self) -> &C { &self.client }

    /// Runs the export. `console` receives the user-facing lines.
    ///
    /// Errors returned here are fatal: instance lookup, listing, describe and filesystem
    /// writes. Per-artifact fetch errors are reported on `console` and collected in the report.
    pub async fn export<W: Write>(&self, filter: &NameFilter, console: &mut W) -> Result<ExportReport> {
        out::ensure_dir(&self.out_root)?;

        let instance_arn = self.client.first_instance_arn().await.context("list Identity Center instances")?;
        info!(%instance_arn, "using Identity Center instance");

        let arns = self.client.list_permission_set_arns(&instance_arn).await
            .with_context(|| format!("list permission sets for {instance_arn}"))?;
        debug!(count = arns.len(), "listed permission sets");

        let mut report = ExportReport { instance_arn: instance_arn.clone(), ..Default::default() };

        for ps_arn in &arns {
            let ps = self.client.describe_permission_set(&instance_arn, ps_arn).await
                .with_context(|| format!("describe permission set {ps_arn}"))?;
            let name = ps.name.clone();

            if !filter.matches(&name) {
                debug!(%name, "excluded by filter");
                report.skipped.push(name);
                continue;
            }

            let dir = match out::permission_set_dir(&self.out_root, &name) {
                Ok(d) => d,
                Err(e) => {
                    warn!(%name, error = %e, "skipping permission set");
                    writeln!(console, "Error: {e}; skipping")?;
                    report.rejected.push(name);
                    continue;
                }
            };
            out::ensure_dir(&dir)?;

            let mut written = Vec::new();
            out::write_json(&dir, Artifact::Metadata.file_name(), &ps)?;
            written.push(Artifact::Metadata);

            match self.client.inline_policy(&instance_arn, ps_arn).await {
                Ok(Some(text)) if !text.is_empty() => match serde_json::from_str::<Json>(&text) {
                    Ok(doc) => {
                        out::write_json(&dir, Artifact::InlinePolicy.file_name(), &doc)?;
                        written.push(Artifact::InlinePolicy);
                    }
                    Err(e) => {
                        let err = FetchError::Other(format!("inline policy is not valid JSON: {e}"));
                        fail(&mut report, console, &name, Artifact::InlinePolicy, &err)?;
                    }
                },
                Ok(_) | Err(FetchError::NotFound(_)) => {}
                Err(e) => fail(&mut report, console, &name, Artifact::InlinePolicy, &e)?,
            }

            match self.client.permissions_boundary(&instance_arn, ps_arn).await {
                Ok(Some(boundary)) => {
                    out::write_json(&dir, Artifact::Boundary.file_name(), &boundary)?;
                    written.push(Artifact::Boundary);
                }
                Ok(None) | Err(FetchError::NotFound(_)) => {}
                Err(e) => fail(&mut report, console, &name, Artifact::Boundary, &e)?,
            }

            // no absence case here: every error is reported, not-found included
            match self.client.managed_policies(&instance_arn, ps_arn).await {
                Ok(policies) => {
                    out::write_json(&dir, Artifact::ManagedPolicies.file_name(), &policies)?;
                    written.push(Artifact::ManagedPolicies);
                }
                Err(e) => fail(&mut report, console, &name, Artifact::ManagedPolicies, &e)?,
            }

            match self.client.tags(&instance_arn, ps_arn).await {
                Ok(tags) => {
                    out::write_json(&dir, Artifact::Tags.file_name(), &tags)?;
                    written.push(Artifact::Tags);
                }
                Err(e) => fail(&mut report, console, &name, Artifact::Tags, &e)?,
            }

            let labels: Vec<&str> = written.iter().map(|a| a.label()).collect();
            info!(%name, artifacts = ?labels, "exported permission set");
            report.exported.push(ExportedPermissionSet { name, dir, written });
        }

        writeln!(console, "Permission sets and policies have been saved to {}", self.out_root.display())?;
        Ok(report)
    }
}

fn fail<W: Write>(
    report: &mut ExportReport,
    console: &mut W,
    name: &str,
    artifact: Artifact,
    err: &FetchError,
) -> std::io::Result<()> {
    warn!(permission_set = name, artifact = artifact.label(), error = %err, "artifact fetch failed");
    writeln!(console, "Error getting {} for {}: {}", artifact.label(), name, err)?;
    report.failures.push(ArtifactFailure {
        permission_set: name.to_string(),
        artifact,
        message: err.to_string(),
    });
    Ok(())
}
