//! # Handlers Module
//!
//! Entry points of the two tools. Each handler takes its remote collaborators
//! as trait objects or generics so it can run against fakes in tests.
//!
//! - **upload**: publish a static asset (versioned object + latest alias)
//! - **provision**: create the Terraform state bucket and lock table

pub mod provision;
pub mod upload;
