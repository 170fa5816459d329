//! # Authorizer Registration
//!
//! Replaces the remote authorizer set wholesale: authorizers carry no stable
//! identity across runs, so every existing one is deleted and the declared
//! set recreated in map key order. Non-Cognito backends are resolved to an
//! invocation URI and granted invoke permission under the API's
//! `authorizers/*` source path first.

use crate::config::{AuthorizerSpec, AuthorizerType, VersionQualifier};
use crate::constants::{AUTHORIZER_SOURCE_PATH, DEFAULT_IDENTITY_HEADER};
use crate::permissions::allow_api_invocation;
use crate::provider::{AuthorizerRequest, GatewayApi, LambdaApi};
use crate::FunctionTarget;
use anyhow::{bail, Result};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Replace the API's authorizers with the declared map; returns name → id
/// for method configuration to reference.
pub async fn register_authorizers(
    gateway: &dyn GatewayApi,
    lambda: &dyn LambdaApi,
    target: &FunctionTarget,
    rest_api_id: &str,
    authorizers: &IndexMap<String, AuthorizerSpec>,
) -> Result<HashMap<String, String>> {
    for existing in gateway.get_authorizers(rest_api_id).await? {
        gateway.delete_authorizer(rest_api_id, &existing.id).await?;
    }

    let mut ids = HashMap::new();
    for (name, spec) in authorizers {
        let request = build_authorizer_request(lambda, target, rest_api_id, name, spec).await?;
        let id = gateway.create_authorizer(rest_api_id, request).await?;
        ids.insert(name.clone(), id);
    }
    Ok(ids)
}

/// Effective type: explicit declaration, else Cognito when provider ARNs are
/// configured, else a token authorizer.
fn effective_type(spec: &AuthorizerSpec) -> AuthorizerType {
    spec.authorizer_type.unwrap_or({
        if spec.provider_arns.is_empty() {
            AuthorizerType::Token
        } else {
            AuthorizerType::CognitoUserPools
        }
    })
}

fn identity_source(spec: &AuthorizerSpec) -> String {
    spec.identity_source.clone().unwrap_or_else(|| {
        format!(
            "method.request.header.{}",
            spec.header_name.as_deref().unwrap_or(DEFAULT_IDENTITY_HEADER)
        )
    })
}

async fn build_authorizer_request(
    lambda: &dyn LambdaApi,
    target: &FunctionTarget,
    rest_api_id: &str,
    name: &str,
    spec: &AuthorizerSpec,
) -> Result<AuthorizerRequest> {
    let kind = effective_type(spec);
    let mut request = AuthorizerRequest {
        name: name.to_string(),
        authorizer_type: kind.as_str().to_string(),
        identity_source: identity_source(spec),
        identity_validation_expression: spec.validation_expression.clone(),
        credentials: spec.credentials.clone(),
        result_ttl_seconds: spec.result_ttl,
        ..AuthorizerRequest::default()
    };

    if kind == AuthorizerType::CognitoUserPools {
        request.provider_arns = spec.provider_arns.clone();
    } else {
        allow_invocation(lambda, target, rest_api_id, spec).await?;
        let backend_arn = resolve_backend_arn(lambda, name, spec).await?;
        request.authorizer_uri = Some(target.authorizer_invocation_uri(&backend_arn));
    }
    Ok(request)
}

/// Backend ARN of a non-Cognito authorizer: the direct ARN as given, or the
/// named function's ARN with the declared version qualifier appended.
async fn resolve_backend_arn(
    lambda: &dyn LambdaApi,
    name: &str,
    spec: &AuthorizerSpec,
) -> Result<String> {
    if let Some(arn) = &spec.lambda_arn {
        return Ok(arn.clone());
    }
    if let Some(function_name) = &spec.lambda_name {
        let base = lambda.get_function_arn(function_name).await?;
        let suffix = match &spec.lambda_version {
            Some(VersionQualifier::StageAlias(true)) => {
                ":${stageVariables.lambdaVersion}".to_string()
            }
            Some(VersionQualifier::Version(version)) => format!(":{version}"),
            _ => String::new(),
        };
        return Ok(format!("{base}{suffix}"));
    }
    bail!("authorizer \"{name}\" has no function backend to resolve");
}

/// Grant a named authorizer backend permission to be invoked by this API.
/// Direct-ARN backends are assumed to manage their own policy.
async fn allow_invocation(
    lambda: &dyn LambdaApi,
    target: &FunctionTarget,
    rest_api_id: &str,
    spec: &AuthorizerSpec,
) -> Result<()> {
    let Some(function_name) = &spec.lambda_name else {
        return Ok(());
    };
    let qualifier = match &spec.lambda_version {
        Some(VersionQualifier::Version(version)) => Some(version.clone()),
        Some(VersionQualifier::StageAlias(true)) => Some(target.function_version.clone()),
        _ => None,
    };
    allow_api_invocation(
        lambda,
        target,
        rest_api_id,
        function_name,
        qualifier.as_deref(),
        Some(AUTHORIZER_SOURCE_PATH),
    )
    .await
}
