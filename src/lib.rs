//! # webpage-ops
//!
//! Operational tooling for the LIMIT.Lab webpage on AWS. The crate ships two
//! single-pass, idempotent command-line tools:
//!
//! - **upload-static**: publishes a static asset to the CloudFront origin
//!   bucket under a fixed two-level key layout, as an immutable versioned
//!   object plus a short-lived "latest" alias, and prints a JSON summary
//! - **create-terraform-backend**: provisions the Terraform remote-state
//!   backend (S3 bucket + DynamoDB lock table) for the active account
//!
//! ## Architecture
//!
//! - **Config**: immutable account-to-environment table, built once per process
//! - **Identity**: resolves the active AWS account and maps it to an environment
//! - **Validation / Utils**: pure naming, hashing and header rules
//! - **Store / Backend**: trait seams over the S3, DynamoDB and IAM clients
//! - **Handlers**: the upload and provisioning flows
//!
//! ## Published Layout
//!
//! ```text
//! {event}/{type}/{slug}_{version-tag}_{hash12}{-lang}{-variant}.{ext}
//! {event}/{type}/{slug}_latest{-lang}{-variant}.{ext}
//! ```
//!
//! ## Exit Codes
//!
//! `0` success (upload or preview), `1` validation or generic error, `3` AWS
//! API error. Every run prints exactly one JSON object on stdout.

pub mod backend;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod handlers;
pub mod identity;
pub mod logging;
pub mod models;
pub mod store;
pub mod utils;
pub mod validation;

pub use config::Config;
pub use errors::{AppError, AppResult};
