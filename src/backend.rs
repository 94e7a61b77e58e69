//! # Terraform State Backend Clients
//!
//! Remote operations used by the provisioner: the S3 state bucket, the
//! DynamoDB lock table, and discovery of the SSO administrator role that is
//! granted access to the bucket.
//!
//! Role discovery depends on the identity provider's role-naming convention,
//! so it sits behind its own trait. A lookup that finds nothing makes the
//! provisioner skip the bucket policy.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, KeySchemaElement, KeyType, ProvisionedThroughput, ScalarAttributeType,
};
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration,
    ServerSideEncryption, ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration,
    ServerSideEncryptionRule, VersioningConfiguration,
};
use serde_json::json;

use crate::constants::{
    LOCK_TABLE_CAPACITY_UNITS, LOCK_TABLE_HASH_KEY, S3_DEFAULT_REGION, SSO_ADMIN_ROLE_PREFIX,
};
use crate::errors::{AppError, AppResult};

#[async_trait]
pub trait StateBackendClient: Send + Sync {
    /// `Ok(false)` only when the bucket is reported as not found.
    async fn bucket_exists(&self, bucket: &str) -> AppResult<bool>;

    async fn create_bucket(&self, bucket: &str, region: &str) -> AppResult<()>;

    async fn enable_versioning(&self, bucket: &str) -> AppResult<()>;

    async fn enable_encryption(&self, bucket: &str) -> AppResult<()>;

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> AppResult<()>;

    async fn table_exists(&self, table: &str) -> AppResult<bool>;

    async fn create_lock_table(&self, table: &str) -> AppResult<()>;
}

#[async_trait]
pub trait AdminRoleLookup: Send + Sync {
    /// ARN of the administrator role, `None` when the account has none.
    async fn find_admin_role_arn(&self, region: &str) -> AppResult<Option<String>>;
}

/// Bucket policy granting `s3:*` on the bucket and its objects to `principal_arn`.
pub fn admin_bucket_policy(bucket: &str, principal_arn: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Sid": "AllowSSOAdministratorAccess",
                "Effect": "Allow",
                "Principal": { "AWS": principal_arn },
                "Action": "s3:*",
                "Resource": [
                    format!("arn:aws:s3:::{}", bucket),
                    format!("arn:aws:s3:::{}/*", bucket)
                ]
            }
        ]
    })
    .to_string()
}

/// IAM path under which SSO-managed roles for `region` live.
pub fn sso_role_path_prefix(region: &str) -> String {
    format!("/aws-reserved/sso.amazonaws.com/{}/", region)
}

fn build_error(err: impl std::fmt::Display) -> AppError {
    AppError::Unclassified(format!("invalid request: {}", err))
}

/// S3 + DynamoDB implementation, both clients bound to the target region.
pub struct AwsStateBackend {
    s3: aws_sdk_s3::Client,
    dynamodb: aws_sdk_dynamodb::Client,
}

impl AwsStateBackend {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            s3: aws_sdk_s3::Client::new(sdk_config),
            dynamodb: aws_sdk_dynamodb::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl StateBackendClient for AwsStateBackend {
    async fn bucket_exists(&self, bucket: &str) -> AppResult<bool> {
        match self.s3.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    return Ok(false);
                }
                Err(AppError::provider(err))
            }
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> AppResult<()> {
        let mut request = self.s3.create_bucket().bucket(bucket);
        if region != S3_DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        request.send().await.map_err(AppError::provider)?;
        Ok(())
    }

    async fn enable_versioning(&self, bucket: &str) -> AppResult<()> {
        self.s3
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .map_err(AppError::provider)?;
        Ok(())
    }

    async fn enable_encryption(&self, bucket: &str) -> AppResult<()> {
        let by_default = ServerSideEncryptionByDefault::builder()
            .sse_algorithm(ServerSideEncryption::Aes256)
            .build()
            .map_err(build_error)?;
        let configuration = ServerSideEncryptionConfiguration::builder()
            .rules(
                ServerSideEncryptionRule::builder()
                    .apply_server_side_encryption_by_default(by_default)
                    .build(),
            )
            .build()
            .map_err(build_error)?;

        self.s3
            .put_bucket_encryption()
            .bucket(bucket)
            .server_side_encryption_configuration(configuration)
            .send()
            .await
            .map_err(AppError::provider)?;
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> AppResult<()> {
        self.s3
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(AppError::provider)?;
        Ok(())
    }

    async fn table_exists(&self, table: &str) -> AppResult<bool> {
        let mut names = self.dynamodb.list_tables().into_paginator().items().send();
        while let Some(name) = names.next().await {
            if name.map_err(AppError::provider)? == table {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn create_lock_table(&self, table: &str) -> AppResult<()> {
        let key = KeySchemaElement::builder()
            .attribute_name(LOCK_TABLE_HASH_KEY)
            .key_type(KeyType::Hash)
            .build()
            .map_err(build_error)?;
        let attribute = AttributeDefinition::builder()
            .attribute_name(LOCK_TABLE_HASH_KEY)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(build_error)?;
        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(LOCK_TABLE_CAPACITY_UNITS)
            .write_capacity_units(LOCK_TABLE_CAPACITY_UNITS)
            .build()
            .map_err(build_error)?;

        self.dynamodb
            .create_table()
            .table_name(table)
            .key_schema(key)
            .attribute_definitions(attribute)
            .provisioned_throughput(throughput)
            .send()
            .await
            .map_err(AppError::provider)?;
        Ok(())
    }
}

/// Finds the SSO `AdministratorAccess` role by paging IAM `ListRoles`.
pub struct SsoAdminRoleLookup {
    iam: aws_sdk_iam::Client,
}

impl SsoAdminRoleLookup {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            iam: aws_sdk_iam::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl AdminRoleLookup for SsoAdminRoleLookup {
    async fn find_admin_role_arn(&self, region: &str) -> AppResult<Option<String>> {
        let mut roles = self
            .iam
            .list_roles()
            .path_prefix(sso_role_path_prefix(region))
            .into_paginator()
            .items()
            .send();

        while let Some(role) = roles.next().await {
            let role = role.map_err(AppError::provider)?;
            if role.role_name().starts_with(SSO_ADMIN_ROLE_PREFIX) {
                return Ok(Some(role.arn().to_string()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_grants_bucket_and_objects_to_principal() {
        let policy: serde_json::Value = serde_json::from_str(&admin_bucket_policy(
            "dev-limitlab-webpage-state",
            "arn:aws:iam::022731370203:role/AWSReservedSSO_AdministratorAccess_0123",
        ))
        .unwrap();

        let statement = &policy["Statement"][0];
        assert_eq!(policy["Version"], "2012-10-17");
        assert_eq!(statement["Sid"], "AllowSSOAdministratorAccess");
        assert_eq!(statement["Action"], "s3:*");
        assert_eq!(
            statement["Principal"]["AWS"],
            "arn:aws:iam::022731370203:role/AWSReservedSSO_AdministratorAccess_0123"
        );
        assert_eq!(
            statement["Resource"],
            json!([
                "arn:aws:s3:::dev-limitlab-webpage-state",
                "arn:aws:s3:::dev-limitlab-webpage-state/*"
            ])
        );
    }

    #[test]
    fn role_path_prefix_is_scoped_to_region() {
        assert_eq!(
            sso_role_path_prefix("ap-northeast-1"),
            "/aws-reserved/sso.amazonaws.com/ap-northeast-1/"
        );
    }
}
