//! # Proxy API Deployment
//!
//! Creates a fresh REST API that forwards every route to the target
//! function: a greedy `{proxy+}` resource plus the root, both answering
//! `ANY`, with default CORS handling.

use crate::config::{ApiConfig, CorsPolicy, MethodSpec, RouteMethods, SCHEMA_VERSION};
use crate::logger::DeployLogger;
use crate::provider::{GatewayApi, LambdaApi};
use crate::reconcile::rebuild_web_api;
use crate::url::stage_invoke_url;
use crate::{FunctionTarget, WebApiError};
use indexmap::IndexMap;

/// A freshly created and reconciled REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedApi {
    pub id: String,
    pub url: String,
}

/// Catch-all config: `{proxy+}` and the root, method `ANY`.
///
/// `binary_media_types` is a comma-separated override; everything (`*/*`)
/// is treated as binary when unset.
#[must_use]
pub fn proxy_api_config(binary_media_types: Option<&str>) -> ApiConfig {
    let mut any_method = RouteMethods::new();
    any_method.insert("ANY".to_string(), MethodSpec::default());

    let mut routes = IndexMap::new();
    routes.insert("{proxy+}".to_string(), any_method.clone());
    routes.insert(String::new(), any_method);

    ApiConfig {
        version: SCHEMA_VERSION,
        routes,
        cors_handlers: CorsPolicy::Enabled(true),
        binary_media_types: match binary_media_types {
            Some(types) => types
                .split(',')
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect(),
            None => vec!["*/*".to_string()],
        },
        ..ApiConfig::default()
    }
}

/// Create a REST API named after the function and reconcile the catch-all
/// config against it.
#[allow(clippy::missing_errors_doc, reason = "Failure modes are described on WebApiError")]
pub async fn deploy_proxy_api(
    gateway: &dyn GatewayApi,
    lambda: &dyn LambdaApi,
    target: &FunctionTarget,
    binary_media_types: Option<&str>,
    logger: &dyn DeployLogger,
    cache_config_var: Option<&str>,
) -> Result<DeployedApi, WebApiError> {
    let config = proxy_api_config(binary_media_types);

    logger.log_stage("creating REST API");
    let api_id = gateway
        .create_rest_api(&target.function_name, &config.binary_media_types)
        .await?;

    rebuild_web_api(
        gateway,
        lambda,
        target,
        &api_id,
        &config,
        logger,
        cache_config_var,
    )
    .await?;

    let url = stage_invoke_url(&api_id, &target.region, &target.function_version);
    Ok(DeployedApi { id: api_id, url })
}
