use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Prod,
    Dev,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Dev => "dev",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named deployment target with its CDN origin bucket and public domain.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentDescriptor {
    pub name: Environment,
    pub account_id: String,
    pub bucket: String,
    pub domain: String,
}

/// The environment resolved for the active credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentTarget {
    pub env: Environment,
    pub account_id: String,
    pub bucket: String,
    pub domain: String,
}

impl EnvironmentTarget {
    pub fn s3_uri(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("https://{}/{}", self.domain, key)
    }
}

/// Caller-supplied description of the asset to publish.
#[derive(Clone, Debug)]
pub struct AssetDescriptor {
    pub file_path: PathBuf,
    pub event: String,
    pub type_code: String,
    pub slug: String,
    pub version_tag: String,
    pub lang: Option<String>,
    pub variant: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HeaderBundle {
    pub content_type: String,
    pub content_disposition: Option<String>,
    pub versioned_cache_control: String,
    pub latest_cache_control: String,
    pub server_side_encryption: String,
    pub checksum_sha256_b64: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PreviewRecord {
    pub dry_run: bool,
    pub env: Environment,
    pub aws_account_id: String,
    pub bucket: String,
    pub domain: String,
    pub source_file: String,
    pub event: String,
    #[serde(rename = "type")]
    pub type_code: String,
    pub slug: String,
    pub version_tag: String,
    pub content_hash: String,
    pub key_versioned_preview: String,
    pub s3_uri_versioned_preview: String,
    pub cloudfront_url_versioned_preview: String,
    pub key_latest_preview: String,
    pub s3_uri_latest_preview: String,
    pub cloudfront_url_latest_preview: String,
    pub headers: HeaderBundle,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CommittedRecord {
    pub env: Environment,
    pub aws_account_id: String,
    pub bucket: String,
    pub domain: String,
    pub key_versioned: String,
    pub s3_uri_versioned: String,
    pub cloudfront_url_versioned: String,
    pub key_latest: String,
    pub s3_uri_latest: String,
    pub cloudfront_url_latest: String,
}

/// Terminal result of a publication run.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum UploadResult {
    Preview(PreviewRecord),
    Committed(CommittedRecord),
}

/// Resource names derived for a Terraform state backend.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ProvisioningPlan {
    pub environment: Environment,
    pub account_id: String,
    pub project_name: String,
    pub region: String,
    pub state_bucket: String,
    pub lock_table: String,
}

impl ProvisioningPlan {
    pub fn new(environment: Environment, account_id: String, project_name: &str, region: &str) -> Self {
        let state_bucket = format!("{}-{}-state", environment, project_name);
        let lock_table = format!("{}-lock", state_bucket);
        Self {
            environment,
            account_id,
            project_name: project_name.to_string(),
            region: region.to_string(),
            state_bucket,
            lock_table,
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Created,
    AlreadyExists,
    Applied,
    Skipped,
    Failed,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: &'static str,
    pub status: StepStatus,
    pub message: String,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ProvisioningReport {
    pub plan: ProvisioningPlan,
    pub steps: Vec<StepOutcome>,
}

impl ProvisioningReport {
    pub fn new(plan: ProvisioningPlan) -> Self {
        Self { plan, steps: Vec::new() }
    }

    pub fn record(&mut self, step: &'static str, status: StepStatus, message: impl Into<String>) {
        self.steps.push(StepOutcome { step, status, message: message.into() });
    }

    pub fn status_of(&self, step: &str) -> Option<StepStatus> {
        self.steps.iter().find(|outcome| outcome.step == step).map(|outcome| outcome.status)
    }

    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|outcome| outcome.status == StepStatus::Failed)
    }
}
