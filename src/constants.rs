//! # Application Constants
//!
//! This module defines application-wide constants shared by the asset uploader
//! and the Terraform backend provisioner. Centralizing them keeps the published
//! object layout and the provisioned resource names consistent across both tools.
//!
//! ## Caching Policy
//!
//! Fixed cache-control values for versioned objects and the "latest" alias.
//!
//! ## Object Metadata
//!
//! User metadata keys written alongside every published object.
//!
//! ## Provisioning Defaults
//!
//! Default project name, region and naming rules for the state backend.

/// Cache policy for content-addressed versioned objects (one year, immutable)
pub const VERSIONED_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Cache policy for the mutable "latest" alias (five minutes)
pub const ALIAS_CACHE_CONTROL: &str = "public, max-age=300";

/// Server-side encryption algorithm applied to every object (SSE-S3)
pub const SERVER_SIDE_ENCRYPTION: &str = "AES256";

/// Fallback content type when the extension lookup yields nothing
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// The only content type served with an inline Content-Disposition
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Number of hex characters of the SHA-256 digest used in versioned filenames
pub const SHORT_HASH_LENGTH: usize = 12;

/// Middle segment of alias filenames
pub const ALIAS_MARKER: &str = "latest";

/// Required first character of a version tag
pub const VERSION_TAG_PREFIX: char = 'v';

/// Separator prepended to optional filename suffixes
pub const SUFFIX_SEPARATOR: char = '-';

/// Metadata key: name of the source file
pub const META_ORIGINAL_FILENAME: &str = "original-filename";

/// Metadata key: version tag of the published asset
pub const META_VERSION_TAG: &str = "version-tag";

/// Metadata key: short content hash
pub const META_CONTENT_HASH: &str = "content-hash";

/// Metadata key: alias marker on the "latest" object
pub const META_ALIAS: &str = "alias";

/// Metadata key: versioned key the alias was copied from
pub const META_POINTS_TO: &str = "points-to";

/// Default project name for the Terraform backend
pub const DEFAULT_PROJECT_NAME: &str = "limitlab-webpage";

/// Default AWS region for the Terraform backend
pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Region in which S3 rejects an explicit location constraint
pub const S3_DEFAULT_REGION: &str = "us-east-1";

/// Hash key of the Terraform state lock table
pub const LOCK_TABLE_HASH_KEY: &str = "LockID";

/// Provisioned read/write capacity of the lock table
pub const LOCK_TABLE_CAPACITY_UNITS: i64 = 1;

/// Role name prefix of the SSO administrator role granted bucket access
pub const SSO_ADMIN_ROLE_PREFIX: &str = "AWSReservedSSO_AdministratorAccess";

/// Environment variable naming an environment table override file
pub const ENV_CONFIG_VAR: &str = "WEBPAGE_OPS_ENV_CONFIG";

/// Process exit code for validation and unclassified failures
pub const EXIT_GENERIC_ERROR: u8 = 1;

/// Process exit code for provider API failures
pub const EXIT_PROVIDER_ERROR: u8 = 3;
