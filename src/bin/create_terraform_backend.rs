//! Creates the Terraform backend (S3 state bucket + DynamoDB lock table) for
//! the environment of the active AWS account. Safe to run repeatedly.

use std::process::ExitCode;

use aws_config::{BehaviorVersion, Region};
use clap::Parser;

use webpage_ops::backend::{AwsStateBackend, SsoAdminRoleLookup};
use webpage_ops::cli::ProvisionArgs;
use webpage_ops::constants::EXIT_GENERIC_ERROR;
use webpage_ops::handlers::provision::{plan_backend, provision_backend};
use webpage_ops::identity::StsIdentityResolver;
use webpage_ops::logging::{self, Logger};
use webpage_ops::utils::generate_unique_identifier;
use webpage_ops::{log_data, AppError, Config};

fn fail(logger: &Logger, err: &AppError) -> ExitCode {
    logger.error("Provisioning aborted", log_data!("error" => err.to_string()));
    println!("{}", err.to_json());
    ExitCode::from(EXIT_GENERIC_ERROR)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();
    let args = ProvisionArgs::parse();
    let logger = Logger::new(generate_unique_identifier());

    let config = match Config::load(args.env_config.as_deref()) {
        Ok(config) => config,
        Err(err) => return fail(&logger, &err),
    };

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(args.region.clone()))
        .load()
        .await;

    let resolver = StsIdentityResolver::new(&sdk_config);
    let plan = match plan_backend(&config, &resolver, &args.project_name, &args.region).await {
        Ok(plan) => plan,
        Err(err) => return fail(&logger, &err),
    };
    logger.info(
        "Detected environment",
        log_data!("env" => plan.environment, "account_id" => plan.account_id),
    );

    let backend = AwsStateBackend::new(&sdk_config);
    let roles = SsoAdminRoleLookup::new(&sdk_config);
    let report = provision_backend(plan, &backend, &roles, &logger).await;

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => return fail(&logger, &AppError::Unclassified(e.to_string())),
    }
    ExitCode::SUCCESS
}
