//! # Reconciliation Driver
//!
//! Brings a REST API's remote resource tree into conformance with a
//! declarative config, idempotently and strictly sequentially:
//!
//! 1. Validate the config; nothing remote happens for a rejected config
//! 2. Compare the config signature against the stage's stored one; a match
//!    skips the whole run
//! 3. Clear stale gateway responses, replace the authorizer set, configure
//!    every path and method in declaration order, re-apply gateway response
//!    overrides, and commit a stage deployment
//!
//! A failure at any step aborts the remainder and leaves the tree partially
//! reconciled; per-path creation is idempotent and the signature only gets
//! stored on a completed run, so the next run picks up the rest.

use crate::config::{validate_api_config, ApiConfig, RouteMethods};
use crate::constants::STAGE_VARIABLE_FUNCTION_VERSION;
use crate::logger::DeployLogger;
use crate::permissions::allow_api_invocation;
use crate::provider::{GatewayApi, LambdaApi};
use crate::{FunctionTarget, WebApiError};
use std::collections::HashMap;
use tracing::warn;

mod authorizers;
mod cors;
mod methods;
mod paths;
mod responses;
mod signature;

pub use authorizers::register_authorizers;
pub use cors::create_cors_handler;
pub use methods::{
    derive_authorization_type, derive_credentials, flatten_request_parameters, path_parameters,
    MethodConfigurator,
};
pub use paths::{split_path, PathResolver};
pub use responses::{clear_gateway_responses, configure_gateway_responses};
pub use signature::config_signature;

/// Terminal report of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildOutcome {
    /// Whether the stored signature matched and the run was skipped.
    pub cache_reused: bool,
}

/// Reconcile `config` against the API `rest_api_id` and deploy a stage named
/// after the target's function version.
///
/// When `cache_config_var` is given, the freshly computed config signature
/// is compared against that stage variable to skip no-op runs, and stored
/// under it on every completed run.
#[allow(clippy::missing_errors_doc, reason = "Failure modes are described on WebApiError")]
pub async fn rebuild_web_api(
    gateway: &dyn GatewayApi,
    lambda: &dyn LambdaApi,
    target: &FunctionTarget,
    rest_api_id: &str,
    config: &ApiConfig,
    logger: &dyn DeployLogger,
    cache_config_var: Option<&str>,
) -> Result<RebuildOutcome, WebApiError> {
    validate_api_config(config).map_err(WebApiError::Validation)?;
    let signature = config_signature(config)?;

    if let Some(cache_var) = cache_config_var {
        match gateway
            .get_stage_variables(rest_api_id, &target.function_version)
            .await
        {
            Ok(Some(variables)) if variables.get(cache_var) == Some(&signature) => {
                logger.log_stage("reusing cached API configuration");
                return Ok(RebuildOutcome { cache_reused: true });
            }
            Ok(_) => {}
            Err(error) => {
                // A brand-new API has no stage to probe; rebuild regardless.
                warn!("could not read the stored config signature: {error:#}");
            }
        }
    }

    logger.log_stage("clearing gateway responses");
    clear_gateway_responses(gateway, rest_api_id).await?;

    logger.log_stage("registering authorizers");
    let authorizer_ids = if config.authorizers.is_empty() {
        HashMap::new()
    } else {
        register_authorizers(gateway, lambda, target, rest_api_id, &config.authorizers).await?
    };

    logger.log_stage("updating REST API");
    allow_api_invocation(
        lambda,
        target,
        rest_api_id,
        &target.function_name,
        Some(&target.function_version),
        None,
    )
    .await?;

    let mut resolver = PathResolver::new();
    resolver.seed(gateway, rest_api_id).await?;
    for (path, route_methods) in &config.routes {
        configure_path(
            gateway,
            rest_api_id,
            target,
            config,
            &authorizer_ids,
            &mut resolver,
            path,
            route_methods,
        )
        .await?;
    }

    if !config.custom_responses.is_empty() {
        logger.log_stage("configuring gateway responses");
        configure_gateway_responses(gateway, rest_api_id, &config.custom_responses).await?;
    }

    logger.log_stage("deploying API");
    let mut variables = HashMap::from([(
        STAGE_VARIABLE_FUNCTION_VERSION.to_string(),
        target.function_version.clone(),
    )]);
    if let Some(cache_var) = cache_config_var {
        variables.insert(cache_var.to_string(), signature);
    }
    gateway
        .create_deployment(rest_api_id, &target.function_version, variables)
        .await?;

    Ok(RebuildOutcome {
        cache_reused: false,
    })
}

#[allow(clippy::too_many_arguments, reason = "Private helper of the driver sequence")]
async fn configure_path(
    gateway: &dyn GatewayApi,
    rest_api_id: &str,
    target: &FunctionTarget,
    config: &ApiConfig,
    authorizer_ids: &HashMap<String, String>,
    resolver: &mut PathResolver,
    path: &str,
    route_methods: &RouteMethods,
) -> Result<(), WebApiError> {
    let resource_id = resolver.resolve(gateway, rest_api_id, path).await?;

    let configurator = MethodConfigurator {
        gateway,
        rest_api_id,
        target,
        authorizer_ids,
    };
    for (method_name, spec) in route_methods {
        configurator
            .configure(&resource_id, path, method_name, spec)
            .await?;
    }

    // A declared OPTIONS route always wins over synthesis.
    if config.cors_handlers.is_enabled() && !route_methods.contains_key("OPTIONS") {
        let supported_methods: Vec<String> = route_methods.keys().cloned().collect();
        create_cors_handler(
            gateway,
            rest_api_id,
            target,
            config,
            &resource_id,
            &supported_methods,
        )
        .await?;
    }
    Ok(())
}
