use std::path::PathBuf;

use clap::Parser;

use crate::constants::{DEFAULT_PROJECT_NAME, DEFAULT_REGION, ENV_CONFIG_VAR};
use crate::models::AssetDescriptor;

/// Upload a static asset to the LIMIT.Lab CDN (environment detected from the AWS account)
#[derive(Parser, Debug)]
#[command(name = "upload-static", version, long_about = None)]
pub struct UploadArgs {
    /// Path to source file
    #[arg(long)]
    pub file: PathBuf,

    /// Event id (e.g., iccv2025)
    #[arg(long)]
    pub event: String,

    /// Asset type code (s|p|r|a)
    #[arg(long = "type")]
    pub type_code: String,

    /// Slug (descriptive name)
    #[arg(long)]
    pub slug: String,

    /// Version tag (e.g., "v2025-10-19" or "v1.2.3")
    #[arg(long)]
    pub version_tag: String,

    /// Optional language suffix (e.g., "ja" or "-ja")
    #[arg(long)]
    pub lang: Option<String>,

    /// Optional variant suffix (e.g., "w1200" or "-w1200")
    #[arg(long)]
    pub variant: Option<String>,

    /// Print a preview without uploading (still calls STS)
    #[arg(long)]
    pub dry_run: bool,

    /// JSON file replacing the built-in account/environment table
    #[arg(long, env = ENV_CONFIG_VAR)]
    pub env_config: Option<PathBuf>,
}

impl UploadArgs {
    pub fn asset(&self) -> AssetDescriptor {
        AssetDescriptor {
            file_path: self.file.clone(),
            event: self.event.clone(),
            type_code: self.type_code.clone(),
            slug: self.slug.clone(),
            version_tag: self.version_tag.clone(),
            lang: self.lang.clone(),
            variant: self.variant.clone(),
        }
    }
}

/// Create S3 bucket and DynamoDB table for Terraform backend
#[derive(Parser, Debug)]
#[command(name = "create-terraform-backend", version, long_about = None)]
pub struct ProvisionArgs {
    /// Project name
    #[arg(long, default_value = DEFAULT_PROJECT_NAME)]
    pub project_name: String,

    /// AWS region to use
    #[arg(long, default_value = DEFAULT_REGION)]
    pub region: String,

    /// JSON file replacing the built-in account/environment table
    #[arg(long, env = ENV_CONFIG_VAR)]
    pub env_config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn commands_are_well_formed() {
        UploadArgs::command().debug_assert();
        ProvisionArgs::command().debug_assert();
    }

    #[test]
    fn upload_flags_map_onto_the_asset() {
        let args = UploadArgs::try_parse_from([
            "upload-static",
            "--file",
            "./slides/opening-ja.pdf",
            "--event",
            "iccv2025",
            "--type",
            "s",
            "--slug",
            "opening-remarks",
            "--version-tag",
            "v2025-10-19",
            "--lang",
            "ja",
            "--dry-run",
        ])
        .unwrap();

        assert!(args.dry_run);
        let asset = args.asset();
        assert_eq!(asset.type_code, "s");
        assert_eq!(asset.lang.as_deref(), Some("ja"));
        assert!(asset.variant.is_none());
    }

    #[test]
    fn upload_requires_the_version_tag() {
        let err = UploadArgs::try_parse_from([
            "upload-static", "--file", "a.pdf", "--event", "e", "--type", "s", "--slug", "x",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn provision_defaults() {
        let args = ProvisionArgs::try_parse_from(["create-terraform-backend"]).unwrap();
        assert_eq!(args.project_name, "limitlab-webpage");
        assert_eq!(args.region, "ap-northeast-1");
    }
}
