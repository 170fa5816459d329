//! # AWS Control-Plane Clients
//!
//! [`GatewayApi`] and [`LambdaApi`] implementations over the AWS SDK.
//!
//! Every call here:
//! - Emits a `service.method` log line before executing
//! - Retries `TooManyRequestsException` rejections under a bounded budget
//! - Propagates every other failure unchanged
//!
//! The control-plane rate-limits mutations per API aggressively, so the
//! retry wrapper is load-bearing rather than defensive.

use crate::constants::{AUTHORIZER_PAGE_LIMIT, GATEWAY_RESPONSE_PAGE_LIMIT, RESOURCE_PAGE_LIMIT};
use crate::logger::DeployLogger;
use crate::provider::{
    AuthorizerItem, AuthorizerRequest, GatewayApi, GatewayResponseItem, GatewayResponseRequest,
    IntegrationKind, IntegrationRequest, IntegrationResponseRequest, LambdaApi, MethodRequest,
    MethodResponseRequest, PermissionRequest, ResourceItem,
};
use crate::retry::{with_retries, RetryPolicy};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_apigateway::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_apigateway::types::{
    AuthorizerType, ContentHandlingStrategy, GatewayResponseType, IntegrationType,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Static mock integration answer; the response pair supplies the rest.
const MOCK_STATUS_TEMPLATE: &str = "{\"statusCode\": 200}";

fn throttled<E, R>(error: &SdkError<E, R>) -> bool
where
    E: ProvideErrorMetadata,
{
    error
        .as_service_error()
        .and_then(ProvideErrorMetadata::code)
        == Some("TooManyRequestsException")
}

fn non_empty_map(map: &BTreeMap<String, String>) -> Option<HashMap<String, String>> {
    if map.is_empty() {
        None
    } else {
        Some(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// API Gateway client with throttle retries and call logging.
pub struct AwsGateway {
    client: aws_sdk_apigateway::Client,
    retry: RetryPolicy,
    logger: Arc<dyn DeployLogger>,
}

impl std::fmt::Debug for AwsGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsGateway").finish_non_exhaustive()
    }
}

impl AwsGateway {
    #[must_use]
    pub fn new(sdk_config: &SdkConfig, logger: Arc<dyn DeployLogger>) -> Self {
        Self {
            client: aws_sdk_apigateway::Client::new(sdk_config),
            retry: RetryPolicy::default(),
            logger,
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn log_call(&self, call: &str, args: &str) {
        self.logger.log_api_call(call, args);
    }

    fn log_throttle(&self) {
        self.logger
            .log_api_call("rate limited by AWS, retrying shortly", "");
    }
}

#[async_trait]
impl GatewayApi for AwsGateway {
    async fn get_resources(&self, rest_api_id: &str) -> Result<Vec<ResourceItem>> {
        self.log_call("apigateway.getResources", &format!("restApiId={rest_api_id}"));
        let output = with_retries(
            self.retry,
            || {
                self.client
                    .get_resources()
                    .rest_api_id(rest_api_id)
                    .limit(RESOURCE_PAGE_LIMIT)
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| anyhow!("failed to list resources of API {rest_api_id}: {error}"))?;

        Ok(output
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|resource| match (resource.id, resource.path) {
                (Some(id), Some(path)) => Some(ResourceItem { id, path }),
                _ => None,
            })
            .collect())
    }

    async fn create_resource(
        &self,
        rest_api_id: &str,
        parent_id: &str,
        path_part: &str,
    ) -> Result<String> {
        self.log_call(
            "apigateway.createResource",
            &format!("restApiId={rest_api_id} pathPart={path_part}"),
        );
        let output = with_retries(
            self.retry,
            || {
                self.client
                    .create_resource()
                    .rest_api_id(rest_api_id)
                    .parent_id(parent_id)
                    .path_part(path_part)
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| anyhow!("failed to create resource \"{path_part}\": {error}"))?;

        output
            .id
            .context("control-plane returned a resource without an id")
    }

    async fn put_method(&self, rest_api_id: &str, request: MethodRequest) -> Result<()> {
        self.log_call(
            "apigateway.putMethod",
            &format!(
                "resourceId={} httpMethod={}",
                request.resource_id, request.http_method
            ),
        );
        let parameters = if request.request_parameters.is_empty() {
            None
        } else {
            Some(
                request
                    .request_parameters
                    .iter()
                    .map(|(name, required)| (name.clone(), *required))
                    .collect::<HashMap<String, bool>>(),
            )
        };
        let scopes = if request.authorization_scopes.is_empty() {
            None
        } else {
            Some(request.authorization_scopes.clone())
        };
        with_retries(
            self.retry,
            || {
                self.client
                    .put_method()
                    .rest_api_id(rest_api_id)
                    .resource_id(request.resource_id.as_str())
                    .http_method(request.http_method.as_str())
                    .authorization_type(request.authorization_type.as_str())
                    .set_authorizer_id(request.authorizer_id.clone())
                    .set_request_parameters(parameters.clone())
                    .api_key_required(request.api_key_required)
                    .set_authorization_scopes(scopes.clone())
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| {
            anyhow!(
                "failed to register method {} on resource {}: {error}",
                request.http_method,
                request.resource_id
            )
        })?;
        Ok(())
    }

    async fn put_integration(&self, rest_api_id: &str, request: IntegrationRequest) -> Result<()> {
        self.log_call(
            "apigateway.putIntegration",
            &format!(
                "resourceId={} httpMethod={}",
                request.resource_id, request.http_method
            ),
        );
        with_retries(
            self.retry,
            || {
                let builder = self
                    .client
                    .put_integration()
                    .rest_api_id(rest_api_id)
                    .resource_id(request.resource_id.as_str())
                    .http_method(request.http_method.as_str());
                let builder = match &request.kind {
                    IntegrationKind::Proxy {
                        uri,
                        credentials,
                        cache_key_parameters,
                        content_handling,
                    } => builder
                        .r#type(IntegrationType::AwsProxy)
                        .integration_http_method("POST")
                        .passthrough_behavior("WHEN_NO_MATCH")
                        .uri(uri.as_str())
                        .set_credentials(credentials.clone())
                        .set_cache_key_parameters(if cache_key_parameters.is_empty() {
                            None
                        } else {
                            Some(cache_key_parameters.clone())
                        })
                        .set_content_handling(
                            content_handling.as_deref().map(ContentHandlingStrategy::from),
                        ),
                    IntegrationKind::Mock => builder
                        .r#type(IntegrationType::Mock)
                        .request_templates("application/json", MOCK_STATUS_TEMPLATE),
                };
                builder.send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| {
            anyhow!(
                "failed to bind integration for {} on resource {}: {error}",
                request.http_method,
                request.resource_id
            )
        })?;
        Ok(())
    }

    async fn put_method_response(
        &self,
        rest_api_id: &str,
        request: MethodResponseRequest,
    ) -> Result<()> {
        self.log_call(
            "apigateway.putMethodResponse",
            &format!(
                "resourceId={} httpMethod={} statusCode={}",
                request.resource_id, request.http_method, request.status_code
            ),
        );
        let parameters = if request.response_parameters.is_empty() {
            None
        } else {
            Some(
                request
                    .response_parameters
                    .iter()
                    .map(|(name, declared)| (name.clone(), *declared))
                    .collect::<HashMap<String, bool>>(),
            )
        };
        with_retries(
            self.retry,
            || {
                self.client
                    .put_method_response()
                    .rest_api_id(rest_api_id)
                    .resource_id(request.resource_id.as_str())
                    .http_method(request.http_method.as_str())
                    .status_code(request.status_code.as_str())
                    .set_response_parameters(parameters.clone())
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| {
            anyhow!(
                "failed to register method response {} for {} on resource {}: {error}",
                request.status_code,
                request.http_method,
                request.resource_id
            )
        })?;
        Ok(())
    }

    async fn put_integration_response(
        &self,
        rest_api_id: &str,
        request: IntegrationResponseRequest,
    ) -> Result<()> {
        self.log_call(
            "apigateway.putIntegrationResponse",
            &format!(
                "resourceId={} httpMethod={} statusCode={}",
                request.resource_id, request.http_method, request.status_code
            ),
        );
        let parameters = non_empty_map(&request.response_parameters);
        with_retries(
            self.retry,
            || {
                self.client
                    .put_integration_response()
                    .rest_api_id(rest_api_id)
                    .resource_id(request.resource_id.as_str())
                    .http_method(request.http_method.as_str())
                    .status_code(request.status_code.as_str())
                    .set_response_parameters(parameters.clone())
                    .set_content_handling(
                        request
                            .content_handling
                            .as_deref()
                            .map(ContentHandlingStrategy::from),
                    )
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| {
            anyhow!(
                "failed to register integration response {} for {} on resource {}: {error}",
                request.status_code,
                request.http_method,
                request.resource_id
            )
        })?;
        Ok(())
    }

    async fn get_authorizers(&self, rest_api_id: &str) -> Result<Vec<AuthorizerItem>> {
        self.log_call(
            "apigateway.getAuthorizers",
            &format!("restApiId={rest_api_id}"),
        );
        let output = with_retries(
            self.retry,
            || {
                self.client
                    .get_authorizers()
                    .rest_api_id(rest_api_id)
                    .limit(AUTHORIZER_PAGE_LIMIT)
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| anyhow!("failed to list authorizers of API {rest_api_id}: {error}"))?;

        Ok(output
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|authorizer| {
                let id = authorizer.id?;
                Some(AuthorizerItem {
                    id,
                    name: authorizer.name.unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn delete_authorizer(&self, rest_api_id: &str, authorizer_id: &str) -> Result<()> {
        self.log_call(
            "apigateway.deleteAuthorizer",
            &format!("restApiId={rest_api_id} authorizerId={authorizer_id}"),
        );
        with_retries(
            self.retry,
            || {
                self.client
                    .delete_authorizer()
                    .rest_api_id(rest_api_id)
                    .authorizer_id(authorizer_id)
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| anyhow!("failed to delete authorizer {authorizer_id}: {error}"))?;
        Ok(())
    }

    async fn create_authorizer(
        &self,
        rest_api_id: &str,
        request: AuthorizerRequest,
    ) -> Result<String> {
        self.log_call(
            "apigateway.createAuthorizer",
            &format!("restApiId={rest_api_id} name={}", request.name),
        );
        let provider_arns = if request.provider_arns.is_empty() {
            None
        } else {
            Some(request.provider_arns.clone())
        };
        let result_ttl = request
            .result_ttl_seconds
            .map(|ttl| i32::try_from(ttl).unwrap_or(i32::MAX));
        let output = with_retries(
            self.retry,
            || {
                self.client
                    .create_authorizer()
                    .rest_api_id(rest_api_id)
                    .name(request.name.as_str())
                    .r#type(AuthorizerType::from(request.authorizer_type.as_str()))
                    .identity_source(request.identity_source.as_str())
                    .set_authorizer_uri(request.authorizer_uri.clone())
                    .set_provider_arns(provider_arns.clone())
                    .set_identity_validation_expression(
                        request.identity_validation_expression.clone(),
                    )
                    .set_authorizer_credentials(request.credentials.clone())
                    .set_authorizer_result_ttl_in_seconds(result_ttl)
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| anyhow!("failed to create authorizer \"{}\": {error}", request.name))?;

        output
            .id
            .context("control-plane returned an authorizer without an id")
    }

    async fn get_gateway_responses(&self, rest_api_id: &str) -> Result<Vec<GatewayResponseItem>> {
        self.log_call(
            "apigateway.getGatewayResponses",
            &format!("restApiId={rest_api_id}"),
        );
        let output = with_retries(
            self.retry,
            || {
                self.client
                    .get_gateway_responses()
                    .rest_api_id(rest_api_id)
                    .limit(GATEWAY_RESPONSE_PAGE_LIMIT)
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| {
            anyhow!("failed to list gateway responses of API {rest_api_id}: {error}")
        })?;

        Ok(output
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|response| {
                let response_type = response.response_type?;
                Some(GatewayResponseItem {
                    response_type: response_type.as_str().to_string(),
                    default_response: response.default_response,
                })
            })
            .collect())
    }

    async fn delete_gateway_response(&self, rest_api_id: &str, response_type: &str) -> Result<()> {
        self.log_call(
            "apigateway.deleteGatewayResponse",
            &format!("restApiId={rest_api_id} responseType={response_type}"),
        );
        with_retries(
            self.retry,
            || {
                self.client
                    .delete_gateway_response()
                    .rest_api_id(rest_api_id)
                    .response_type(GatewayResponseType::from(response_type))
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| anyhow!("failed to delete gateway response {response_type}: {error}"))?;
        Ok(())
    }

    async fn put_gateway_response(
        &self,
        rest_api_id: &str,
        request: GatewayResponseRequest,
    ) -> Result<()> {
        self.log_call(
            "apigateway.putGatewayResponse",
            &format!(
                "restApiId={rest_api_id} responseType={}",
                request.response_type
            ),
        );
        let parameters = non_empty_map(&request.response_parameters);
        let templates = non_empty_map(&request.response_templates);
        with_retries(
            self.retry,
            || {
                self.client
                    .put_gateway_response()
                    .rest_api_id(rest_api_id)
                    .response_type(GatewayResponseType::from(request.response_type.as_str()))
                    .set_status_code(request.status_code.clone())
                    .set_response_parameters(parameters.clone())
                    .set_response_templates(templates.clone())
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| {
            anyhow!(
                "failed to configure gateway response {}: {error}",
                request.response_type
            )
        })?;
        Ok(())
    }

    async fn get_stage_variables(
        &self,
        rest_api_id: &str,
        stage_name: &str,
    ) -> Result<Option<HashMap<String, String>>> {
        self.log_call(
            "apigateway.getStage",
            &format!("restApiId={rest_api_id} stageName={stage_name}"),
        );
        match with_retries(
            self.retry,
            || {
                self.client
                    .get_stage()
                    .rest_api_id(rest_api_id)
                    .stage_name(stage_name)
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        {
            Ok(stage) => Ok(Some(stage.variables.unwrap_or_default())),
            Err(error) => {
                if matches!(error.as_service_error(), Some(service) if service.is_not_found_exception())
                {
                    Ok(None)
                } else {
                    Err(anyhow!("failed to read stage {stage_name}: {error}"))
                }
            }
        }
    }

    async fn create_deployment(
        &self,
        rest_api_id: &str,
        stage_name: &str,
        variables: HashMap<String, String>,
    ) -> Result<()> {
        self.log_call(
            "apigateway.createDeployment",
            &format!("restApiId={rest_api_id} stageName={stage_name}"),
        );
        with_retries(
            self.retry,
            || {
                self.client
                    .create_deployment()
                    .rest_api_id(rest_api_id)
                    .stage_name(stage_name)
                    .set_variables(Some(variables.clone()))
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| anyhow!("failed to deploy stage {stage_name}: {error}"))?;
        Ok(())
    }

    async fn create_rest_api(&self, name: &str, binary_media_types: &[String]) -> Result<String> {
        self.log_call("apigateway.createRestApi", &format!("name={name}"));
        let media_types = if binary_media_types.is_empty() {
            None
        } else {
            Some(binary_media_types.to_vec())
        };
        let output = with_retries(
            self.retry,
            || {
                self.client
                    .create_rest_api()
                    .name(name)
                    .set_binary_media_types(media_types.clone())
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| anyhow!("failed to create REST API \"{name}\": {error}"))?;

        output
            .id
            .context("control-plane returned a REST API without an id")
    }
}

/// Lambda client with throttle retries and call logging.
pub struct AwsLambda {
    client: aws_sdk_lambda::Client,
    retry: RetryPolicy,
    logger: Arc<dyn DeployLogger>,
}

impl std::fmt::Debug for AwsLambda {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsLambda").finish_non_exhaustive()
    }
}

impl AwsLambda {
    #[must_use]
    pub fn new(sdk_config: &SdkConfig, logger: Arc<dyn DeployLogger>) -> Self {
        Self {
            client: aws_sdk_lambda::Client::new(sdk_config),
            retry: RetryPolicy::default(),
            logger,
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn log_throttle(&self) {
        self.logger
            .log_api_call("rate limited by AWS, retrying shortly", "");
    }
}

#[async_trait]
impl LambdaApi for AwsLambda {
    async fn get_function_arn(&self, function_name: &str) -> Result<String> {
        self.logger.log_api_call(
            "lambda.getFunctionConfiguration",
            &format!("functionName={function_name}"),
        );
        let output = with_retries(
            self.retry,
            || {
                self.client
                    .get_function_configuration()
                    .function_name(function_name)
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| anyhow!("failed to look up function \"{function_name}\": {error}"))?;

        output
            .function_arn
            .with_context(|| format!("function \"{function_name}\" has no ARN"))
    }

    async fn get_policy(
        &self,
        function_name: &str,
        qualifier: Option<&str>,
    ) -> Result<Option<String>> {
        self.logger.log_api_call(
            "lambda.getPolicy",
            &format!("functionName={function_name}"),
        );
        match with_retries(
            self.retry,
            || {
                self.client
                    .get_policy()
                    .function_name(function_name)
                    .set_qualifier(qualifier.map(str::to_string))
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        {
            Ok(output) => Ok(output.policy),
            Err(error) => {
                if matches!(error.as_service_error(), Some(service) if service.is_resource_not_found_exception())
                {
                    Ok(None)
                } else {
                    Err(anyhow!(
                        "failed to read policy of function \"{function_name}\": {error}"
                    ))
                }
            }
        }
    }

    async fn add_permission(&self, request: PermissionRequest) -> Result<()> {
        self.logger.log_api_call(
            "lambda.addPermission",
            &format!(
                "functionName={} statementId={}",
                request.function_name, request.statement_id
            ),
        );
        with_retries(
            self.retry,
            || {
                self.client
                    .add_permission()
                    .function_name(request.function_name.as_str())
                    .statement_id(request.statement_id.as_str())
                    .action(request.action.as_str())
                    .principal(request.principal.as_str())
                    .source_arn(request.source_arn.as_str())
                    .set_qualifier(request.qualifier.clone())
                    .send()
            },
            throttled,
            || self.log_throttle(),
        )
        .await
        .map_err(|error| {
            anyhow!(
                "failed to grant invoke permission on \"{}\": {error}",
                request.function_name
            )
        })?;
        Ok(())
    }
}
