//! # Web API Reconciler CLI
//!
//! Thin command layer over the reconciliation engine:
//!
//! - `rebuild` reconciles a JSON route-table config against an existing
//!   REST API and deploys a stage
//! - `deploy-proxy` creates a fresh catch-all proxy API for a function
//!
//! Caller identity (account id, partition) is discovered via STS; the
//! region comes from the flag or the ambient AWS configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use web_api_reconciler::config::ApiConfig;
use web_api_reconciler::provider::aws::{AwsGateway, AwsLambda};
use web_api_reconciler::{
    deploy_proxy_api, get_own_info, rebuild_web_api, stage_invoke_url, ConsoleLogger,
    DeployLogger, FunctionTarget,
};

/// Deploys Lambda-backed REST APIs by reconciling a declarative route table
/// against the Amazon API Gateway control-plane.
#[derive(Parser)]
#[command(name = "web-api-reconciler")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")"))]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile a config file against an existing REST API
    Rebuild {
        /// Path to the JSON API config
        #[arg(long)]
        config: PathBuf,
        /// Name of the deployed function the API fronts
        #[arg(long)]
        function_name: String,
        /// Function version or alias; also the stage name
        #[arg(long, default_value = "latest")]
        version: String,
        /// Id of the REST API to reconcile
        #[arg(long)]
        rest_api_id: String,
        /// AWS region; defaults to the ambient configuration
        #[arg(long)]
        region: Option<String>,
        /// Stage variable holding the config signature for no-op detection
        #[arg(long)]
        cache_config_var: Option<String>,
    },
    /// Create a fresh catch-all proxy API for a function
    DeployProxy {
        /// Name of the deployed function the API fronts
        #[arg(long)]
        function_name: String,
        /// Function version or alias; also the stage name
        #[arg(long, default_value = "latest")]
        version: String,
        /// AWS region; defaults to the ambient configuration
        #[arg(long)]
        region: Option<String>,
        /// Comma-separated binary media types; `*/*` when omitted
        #[arg(long)]
        binary_media_types: Option<String>,
        /// Stage variable holding the config signature for no-op detection
        #[arg(long)]
        cache_config_var: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "web_api_reconciler=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Rebuild {
            config,
            function_name,
            version,
            rest_api_id,
            region,
            cache_config_var,
        } => {
            let api_config = load_config(&config)?;
            let (target, gateway, lambda, logger) =
                connect(function_name, version, region).await?;

            let outcome = rebuild_web_api(
                &gateway,
                &lambda,
                &target,
                &rest_api_id,
                &api_config,
                logger.as_ref(),
                cache_config_var.as_deref(),
            )
            .await?;

            let url = stage_invoke_url(&rest_api_id, &target.region, &target.function_version);
            if outcome.cache_reused {
                info!("configuration unchanged, stage reused: {url}");
            } else {
                info!("deployed {url}");
            }
        }
        Command::DeployProxy {
            function_name,
            version,
            region,
            binary_media_types,
            cache_config_var,
        } => {
            let (target, gateway, lambda, logger) =
                connect(function_name, version, region).await?;

            let deployed = deploy_proxy_api(
                &gateway,
                &lambda,
                &target,
                binary_media_types.as_deref(),
                logger.as_ref(),
                cache_config_var.as_deref(),
            )
            .await?;

            info!("created API {} at {}", deployed.id, deployed.url);
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ApiConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

async fn connect(
    function_name: String,
    function_version: String,
    region: Option<String>,
) -> Result<(FunctionTarget, AwsGateway, AwsLambda, Arc<dyn DeployLogger>)> {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region));
    }
    let sdk_config = loader.load().await;
    let region = sdk_config
        .region()
        .context("no AWS region configured; pass --region or set AWS_REGION")?
        .to_string();

    let logger: Arc<dyn DeployLogger> = Arc::new(ConsoleLogger);
    let sts = aws_sdk_sts::Client::new(&sdk_config);
    let own_info = get_own_info(&sts, logger.as_ref()).await?;

    let target = FunctionTarget {
        function_name,
        function_version,
        account_id: own_info.account_id,
        partition: own_info.partition,
        region,
    };
    let gateway = AwsGateway::new(&sdk_config, Arc::clone(&logger));
    let lambda = AwsLambda::new(&sdk_config, Arc::clone(&logger));
    Ok((target, gateway, lambda, logger))
}
