//! # Method Configuration
//!
//! Turns one route's declared options into the control-plane's method,
//! integration and response calls: authorization derivation, credential
//! resolution, request-parameter flattening and content-handling
//! propagation.

use crate::config::{
    is_credential_arn, valid_credentials, AuthType, ContentHandling, InvokeCredentials, MethodSpec,
    RequestParameter, ResponseSpec,
};
use crate::provider::{
    GatewayApi, IntegrationKind, IntegrationRequest, IntegrationResponseRequest, MethodRequest,
    MethodResponseRequest,
};
use crate::FunctionTarget;
use anyhow::Result;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

static PATH_PARAMETER: OnceLock<Regex> = OnceLock::new();

fn path_parameter() -> &'static Regex {
    PATH_PARAMETER
        .get_or_init(|| Regex::new(r"\{([^+}]+)\+?\}").expect("path parameter pattern is valid"))
}

/// Names of `{param}` / `{param+}` template segments in a resource path.
#[must_use]
pub fn path_parameters(resource_path: &str) -> Vec<String> {
    path_parameter()
        .captures_iter(resource_path)
        .map(|capture| capture[1].to_string())
        .collect()
}

/// Authorization type of a method, by precedence: explicit declaration, then
/// whichever authorizer kind is referenced, then IAM when valid credentials
/// are attached, else open.
#[must_use]
pub fn derive_authorization_type(spec: &MethodSpec) -> AuthType {
    if let Some(explicit) = spec.authorization_type {
        return explicit;
    }
    if spec.custom_authorizer.is_some() {
        return AuthType::Custom;
    }
    if spec.cognito_authorizer.is_some() {
        return AuthType::CognitoUserPools;
    }
    if spec
        .invoke_with_credentials
        .as_ref()
        .is_some_and(valid_credentials)
    {
        return AuthType::AwsIam;
    }
    AuthType::None
}

/// Credentials attached to a method's integration: the caller-account
/// wildcard for `true`, a validated ARN as given, nothing otherwise.
#[must_use]
pub fn derive_credentials(spec: &MethodSpec, partition: &str) -> Option<String> {
    match spec.invoke_with_credentials.as_ref()? {
        InvokeCredentials::CallerAccount(true) => Some(format!("arn:{partition}:iam::*:user/*")),
        InvokeCredentials::Arn(arn) if is_credential_arn(arn) => Some(arn.clone()),
        _ => None,
    }
}

/// Flatten declared request parameters, expanding class-grouped entries to
/// `method.request.{class}.{key}` and requiring every path template
/// parameter as `method.request.path.{name}`.
#[must_use]
pub fn flatten_request_parameters(
    parameters: Option<&IndexMap<String, RequestParameter>>,
    resource_path: &str,
) -> BTreeMap<String, bool> {
    let mut result = BTreeMap::new();
    if let Some(parameters) = parameters {
        for (key, value) in parameters {
            match value {
                RequestParameter::Required(required) => {
                    result.insert(key.clone(), *required);
                }
                RequestParameter::Class(class) => {
                    for (subkey, required) in class {
                        result.insert(format!("method.request.{key}.{subkey}"), *required);
                    }
                }
            }
        }
    }
    for name in path_parameters(resource_path) {
        result.insert(format!("method.request.path.{name}"), true);
    }
    result
}

/// Configures the methods of one reconciliation run.
pub struct MethodConfigurator<'a> {
    pub gateway: &'a dyn GatewayApi,
    pub rest_api_id: &'a str,
    pub target: &'a FunctionTarget,
    pub authorizer_ids: &'a HashMap<String, String>,
}

impl MethodConfigurator<'_> {
    /// Register the method, its proxy integration and its response pairs.
    pub async fn configure(
        &self,
        resource_id: &str,
        path: &str,
        method_name: &str,
        spec: &MethodSpec,
    ) -> Result<()> {
        let parameters = flatten_request_parameters(spec.request_parameters.as_ref(), path);
        let authorizer_id = spec
            .authorizer_name()
            .and_then(|name| self.authorizer_ids.get(name).cloned());

        self.gateway
            .put_method(
                self.rest_api_id,
                MethodRequest {
                    resource_id: resource_id.to_string(),
                    http_method: method_name.to_string(),
                    authorization_type: derive_authorization_type(spec).as_str().to_string(),
                    authorizer_id,
                    request_parameters: parameters.clone(),
                    api_key_required: spec.api_key_required,
                    authorization_scopes: spec.authorization_scopes.clone(),
                },
            )
            .await?;

        self.gateway
            .put_integration(
                self.rest_api_id,
                IntegrationRequest {
                    resource_id: resource_id.to_string(),
                    http_method: method_name.to_string(),
                    kind: IntegrationKind::Proxy {
                        uri: self.target.invocation_uri(),
                        credentials: derive_credentials(spec, &self.target.partition),
                        cache_key_parameters: parameters.keys().cloned().collect(),
                        content_handling: spec
                            .request_content_handling
                            .map(|handling| handling.as_str().to_string()),
                    },
                },
            )
            .await?;

        self.put_response_pair(resource_id, method_name, 200, spec.success.as_ref())
            .await?;
        if let Some(error) = &spec.error {
            self.put_response_pair(
                resource_id,
                method_name,
                error.status_code.unwrap_or(500),
                Some(error),
            )
            .await?;
        }
        Ok(())
    }

    async fn put_response_pair(
        &self,
        resource_id: &str,
        method_name: &str,
        default_status: u16,
        shape: Option<&ResponseSpec>,
    ) -> Result<()> {
        let status_code = shape
            .and_then(|shape| shape.status_code)
            .unwrap_or(default_status)
            .to_string();
        let headers = shape.map(|shape| &shape.headers);

        let declared = headers
            .map(|headers| {
                headers
                    .keys()
                    .map(|header| (format!("method.response.header.{header}"), false))
                    .collect()
            })
            .unwrap_or_default();
        self.gateway
            .put_method_response(
                self.rest_api_id,
                MethodResponseRequest {
                    resource_id: resource_id.to_string(),
                    http_method: method_name.to_string(),
                    status_code: status_code.clone(),
                    response_parameters: declared,
                },
            )
            .await?;

        let values = headers
            .map(|headers| {
                headers
                    .iter()
                    .map(|(header, value)| {
                        (format!("method.response.header.{header}"), format!("'{value}'"))
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.gateway
            .put_integration_response(
                self.rest_api_id,
                IntegrationResponseRequest {
                    resource_id: resource_id.to_string(),
                    http_method: method_name.to_string(),
                    status_code,
                    response_parameters: values,
                    content_handling: shape
                        .and_then(|shape| shape.content_handling)
                        .map(ContentHandling::as_str)
                        .map(str::to_string),
                },
            )
            .await
    }
}
