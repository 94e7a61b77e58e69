//! # Configuration Management
//!
//! This module holds the account-to-environment lookup table shared by both
//! tools. The table is built once at process start and passed explicitly to
//! whatever needs to resolve an environment; nothing reads it from global state.
//!
//! ## Configuration Sources
//!
//! 1. **Override file**: JSON file named by `--env-config` or
//!    `WEBPAGE_OPS_ENV_CONFIG`
//! 2. **Defaults**: the built-in prod/dev table
//!
//! ## Override Format
//!
//! ```json
//! {
//!   "environments": [
//!     {
//!       "name": "prod",
//!       "account_id": "664418960222",
//!       "bucket": "prod-limitlab-webpage-cdn-cloudfront-origin",
//!       "domain": "cdn.limitlab.xyz"
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::models::{Environment, EnvironmentDescriptor, EnvironmentTarget};

/// Immutable account-to-environment mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub environments: Vec<EnvironmentDescriptor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environments: vec![
                EnvironmentDescriptor {
                    name: Environment::Prod,
                    account_id: "664418960222".to_string(),
                    bucket: "prod-limitlab-webpage-cdn-cloudfront-origin".to_string(),
                    domain: "cdn.limitlab.xyz".to_string(),
                },
                EnvironmentDescriptor {
                    name: Environment::Dev,
                    account_id: "022731370203".to_string(),
                    bucket: "dev-limitlab-webpage-cdn-cloudfront-origin".to_string(),
                    domain: "cdn.dev.limitlab.xyz".to_string(),
                },
            ],
        }
    }
}

impl Config {
    /// Loads the environment table from `path`, or the built-in table when no
    /// path is given.
    ///
    /// # Errors
    ///
    /// - The file cannot be read or parsed
    /// - The table is empty or lists an account id twice
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let Some(path) = path else {
            info!("No environment table override, using built-in table");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        info!(path = %path.display(), "Environment table loaded from file");
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.environments.is_empty() {
            return Err(AppError::Config("environment table is empty".to_string()));
        }
        for (index, descriptor) in self.environments.iter().enumerate() {
            if self.environments[..index]
                .iter()
                .any(|other| other.account_id == descriptor.account_id)
            {
                return Err(AppError::Config(format!(
                    "account {} is mapped more than once",
                    descriptor.account_id
                )));
            }
        }
        Ok(())
    }

    pub fn lookup(&self, account_id: &str) -> Option<&EnvironmentDescriptor> {
        self.environments.iter().find(|d| d.account_id == account_id)
    }

    /// Maps an account id to its environment target.
    pub fn resolve(&self, account_id: &str) -> AppResult<EnvironmentTarget> {
        let descriptor = self.lookup(account_id).ok_or_else(|| AppError::UnrecognizedEnvironment {
            account_id: account_id.to_string(),
        })?;
        Ok(EnvironmentTarget {
            env: descriptor.name,
            account_id: account_id.to_string(),
            bucket: descriptor.bucket.clone(),
            domain: descriptor.domain.clone(),
        })
    }
}
