//! Identity resolution: which AWS account do the active credentials belong to,
//! and which environment does that account map to.

use async_trait::async_trait;
use aws_config::SdkConfig;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::EnvironmentTarget;

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Account id of the active credentials.
    async fn current_account_id(&self) -> AppResult<String>;
}

/// STS-backed resolver (`GetCallerIdentity`).
pub struct StsIdentityResolver {
    client: aws_sdk_sts::Client,
}

impl StsIdentityResolver {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_sts::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl IdentityResolver for StsIdentityResolver {
    async fn current_account_id(&self) -> AppResult<String> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(AppError::provider)?;

        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| AppError::Unclassified("STS returned no account id".to_string()))
    }
}

/// Asks the resolver for the account id and maps it through the table.
pub async fn resolve_target<R>(config: &Config, resolver: &R) -> AppResult<EnvironmentTarget>
where
    R: IdentityResolver + ?Sized,
{
    let account_id = resolver.current_account_id().await?;
    config.resolve(&account_id)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Resolver returning a fixed account id and counting calls.
    pub struct FixedIdentity {
        pub account_id: Option<String>,
        pub calls: AtomicUsize,
    }

    impl FixedIdentity {
        pub fn new(account_id: &str) -> Self {
            Self { account_id: Some(account_id.to_string()), calls: AtomicUsize::new(0) }
        }

        pub fn failing() -> Self {
            Self { account_id: None, calls: AtomicUsize::new(0) }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityResolver for FixedIdentity {
        async fn current_account_id(&self) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.account_id.clone().ok_or_else(|| AppError::StoreClient {
                code: "ExpiredToken".to_string(),
                message: "The security token included in the request is expired".to_string(),
            })
        }
    }
}
