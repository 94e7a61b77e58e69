//! Minimal CDN uploader with environment auto-detection.
//!
//! The AWS account of the active credentials selects the target bucket and
//! public domain. Dry-run mode performs no S3 writes but still calls STS.

use std::process::ExitCode;

use aws_config::BehaviorVersion;
use clap::Parser;

use webpage_ops::cli::UploadArgs;
use webpage_ops::handlers::upload::run_upload;
use webpage_ops::identity::StsIdentityResolver;
use webpage_ops::logging::{self, Logger};
use webpage_ops::models::UploadResult;
use webpage_ops::store::S3ObjectStore;
use webpage_ops::utils::generate_unique_identifier;
use webpage_ops::{log_data, AppError, AppResult, Config};

async fn run(args: &UploadArgs, logger: &Logger) -> AppResult<UploadResult> {
    let config = Config::load(args.env_config.as_deref())?;

    // Region and credentials come from the default provider chain.
    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let resolver = StsIdentityResolver::new(&sdk_config);
    let store = S3ObjectStore::new(&sdk_config);

    run_upload(&args.asset(), args.dry_run, &config, &resolver, &store, logger).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();
    let args = UploadArgs::parse();
    let logger = Logger::new(generate_unique_identifier());

    let outcome = run(&args, &logger).await.and_then(|result| {
        serde_json::to_string_pretty(&result).map_err(|e| AppError::Unclassified(e.to_string()))
    });

    match outcome {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            logger.error("Upload failed", log_data!("error" => err.to_string()));
            println!("{}", err.to_json());
            ExitCode::from(err.exit_code())
        }
    }
}
