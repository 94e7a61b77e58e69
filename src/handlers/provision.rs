//! # Provision Handler
//!
//! Creates the Terraform remote-state backend for the environment of the
//! active credentials: a versioned, encrypted S3 bucket and a DynamoDB lock
//! table. Every step is idempotent, so the tool can be re-run at will.
//!
//! ## Steps
//!
//! ```text
//! 1. Resolve     → account id → environment (unknown account aborts)
//! 2. Bucket      → head, create when not found
//! 3. Versioning  → Enabled
//! 4. Encryption  → SSE-S3 (AES256) by default
//! 5. Policy      → grant the SSO admin role, skipped when none exists
//! 6. Lock table  → create `LockID` hash-key table when not listed
//! ```
//!
//! Steps 2-6 are best effort: a failure is recorded in the report and the
//! remaining steps still run.

use crate::backend::{admin_bucket_policy, AdminRoleLookup, StateBackendClient};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::identity::{resolve_target, IdentityResolver};
use crate::log_data;
use crate::logging::Logger;
use crate::models::{ProvisioningPlan, ProvisioningReport, StepStatus};

pub const STEP_BUCKET: &str = "state_bucket";
pub const STEP_VERSIONING: &str = "versioning";
pub const STEP_ENCRYPTION: &str = "encryption";
pub const STEP_POLICY: &str = "bucket_policy";
pub const STEP_LOCK_TABLE: &str = "lock_table";

/// Resolves the environment and derives the resource names.
pub async fn plan_backend<R>(
    config: &Config,
    resolver: &R,
    project_name: &str,
    region: &str,
) -> AppResult<ProvisioningPlan>
where
    R: IdentityResolver + ?Sized,
{
    let target = resolve_target(config, resolver).await?;
    Ok(ProvisioningPlan::new(target.env, target.account_id, project_name, region))
}

fn record_failure(report: &mut ProvisioningReport, logger: &Logger, step: &'static str, err: &AppError) {
    logger.warn("Provisioning step failed", log_data!("step" => step, "error" => err.to_string()));
    report.record(step, StepStatus::Failed, err.to_string());
}

async fn ensure_bucket<B>(backend: &B, plan: &ProvisioningPlan, report: &mut ProvisioningReport, logger: &Logger)
where
    B: StateBackendClient + ?Sized,
{
    let bucket = &plan.state_bucket;
    match backend.bucket_exists(bucket).await {
        Ok(true) => {
            logger.info("S3 bucket already exists", log_data!("bucket" => bucket));
            report.record(STEP_BUCKET, StepStatus::AlreadyExists, format!("S3 bucket '{}' already exists.", bucket));
        }
        Ok(false) => match backend.create_bucket(bucket, &plan.region).await {
            Ok(()) => {
                logger.info("S3 bucket created", log_data!("bucket" => bucket, "region" => plan.region));
                report.record(STEP_BUCKET, StepStatus::Created, format!("S3 bucket '{}' created successfully.", bucket));
            }
            Err(err) => record_failure(report, logger, STEP_BUCKET, &err),
        },
        Err(err) => record_failure(report, logger, STEP_BUCKET, &err),
    }
}

async fn apply_bucket_policy<B, L>(
    backend: &B,
    roles: &L,
    plan: &ProvisioningPlan,
    report: &mut ProvisioningReport,
    logger: &Logger,
) where
    B: StateBackendClient + ?Sized,
    L: AdminRoleLookup + ?Sized,
{
    let principal = match roles.find_admin_role_arn(&plan.region).await {
        Ok(Some(arn)) => arn,
        Ok(None) => {
            logger.info("No SSO administrator role found, skipping bucket policy", None);
            report.record(
                STEP_POLICY,
                StepStatus::Skipped,
                "No AWS SSO AdministratorAccess role found; skipping bucket policy application.",
            );
            return;
        }
        Err(err) => return record_failure(report, logger, STEP_POLICY, &err),
    };

    let policy = admin_bucket_policy(&plan.state_bucket, &principal);
    match backend.put_bucket_policy(&plan.state_bucket, &policy).await {
        Ok(()) => {
            logger.info("Bucket policy applied", log_data!("bucket" => plan.state_bucket, "principal" => principal));
            report.record(
                STEP_POLICY,
                StepStatus::Applied,
                format!("Bucket policy applied to '{}'.", plan.state_bucket),
            );
        }
        Err(err) => record_failure(report, logger, STEP_POLICY, &err),
    }
}

async fn ensure_lock_table<B>(backend: &B, plan: &ProvisioningPlan, report: &mut ProvisioningReport, logger: &Logger)
where
    B: StateBackendClient + ?Sized,
{
    let table = &plan.lock_table;
    match backend.table_exists(table).await {
        Ok(true) => {
            logger.info("DynamoDB table already exists", log_data!("table" => table));
            report.record(STEP_LOCK_TABLE, StepStatus::AlreadyExists, format!("DynamoDB table '{}' already exists.", table));
        }
        Ok(false) => match backend.create_lock_table(table).await {
            Ok(()) => {
                logger.info("DynamoDB table created", log_data!("table" => table));
                report.record(STEP_LOCK_TABLE, StepStatus::Created, format!("DynamoDB table '{}' created successfully.", table));
            }
            Err(err) => record_failure(report, logger, STEP_LOCK_TABLE, &err),
        },
        Err(err) => record_failure(report, logger, STEP_LOCK_TABLE, &err),
    }
}

/// Runs every provisioning step for an already derived plan.
pub async fn provision_backend<B, L>(
    plan: ProvisioningPlan,
    backend: &B,
    roles: &L,
    logger: &Logger,
) -> ProvisioningReport
where
    B: StateBackendClient + ?Sized,
    L: AdminRoleLookup + ?Sized,
{
    let mut report = ProvisioningReport::new(plan.clone());

    ensure_bucket(backend, &plan, &mut report, logger).await;

    match backend.enable_versioning(&plan.state_bucket).await {
        Ok(()) => report.record(
            STEP_VERSIONING,
            StepStatus::Applied,
            format!("Versioning enabled on S3 bucket '{}'.", plan.state_bucket),
        ),
        Err(err) => record_failure(&mut report, logger, STEP_VERSIONING, &err),
    }

    match backend.enable_encryption(&plan.state_bucket).await {
        Ok(()) => report.record(
            STEP_ENCRYPTION,
            StepStatus::Applied,
            format!("Encryption enabled on S3 bucket '{}'.", plan.state_bucket),
        ),
        Err(err) => record_failure(&mut report, logger, STEP_ENCRYPTION, &err),
    }

    apply_bucket_policy(backend, roles, &plan, &mut report, logger).await;
    ensure_lock_table(backend, &plan, &mut report, logger).await;

    report
}
