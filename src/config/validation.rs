//! # Config Validation
//!
//! Pre-flight validation of the declarative config. Every rejection here
//! happens before the first remote call and names the offending path, method
//! or authorizer.

use anyhow::{bail, Result};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

use super::{ApiConfig, AuthType, AuthorizerSpec, InvokeCredentials, MethodSpec};

static CREDENTIAL_ARN: OnceLock<Regex> = OnceLock::new();

fn credential_arn() -> &'static Regex {
    CREDENTIAL_ARN.get_or_init(|| {
        Regex::new(r"^arn:aws[^:]*:(iam|sts):[^:]*:(\*|\d{12})?:")
            .expect("credential ARN pattern is valid")
    })
}

/// Whether a string names an IAM/STS principal an integration can assume.
#[must_use]
pub fn is_credential_arn(arn: &str) -> bool {
    credential_arn().is_match(arn)
}

/// Whether a credential declaration can be attached to an integration:
/// either the caller-account wildcard, or an IAM/STS ARN.
#[must_use]
pub fn valid_credentials(credentials: &InvokeCredentials) -> bool {
    match credentials {
        InvokeCredentials::CallerAccount(enabled) => *enabled,
        InvokeCredentials::Arn(arn) => is_credential_arn(arn),
    }
}

/// Validate the whole config. Called by the reconciliation driver before any
/// remote call is issued.
pub fn validate_api_config(config: &ApiConfig) -> Result<()> {
    for (path, methods) in &config.routes {
        for (method_name, spec) in methods {
            validate_method_spec(path, method_name, spec, &config.authorizers)?;
        }
    }
    for (name, authorizer) in &config.authorizers {
        validate_authorizer_spec(name, authorizer)?;
    }
    Ok(())
}

fn validate_method_spec(
    path: &str,
    method_name: &str,
    spec: &MethodSpec,
    authorizers: &IndexMap<String, AuthorizerSpec>,
) -> Result<()> {
    let route = format!("route \"{path}\" method {method_name}");

    if spec.custom_authorizer.is_some() && spec.cognito_authorizer.is_some() {
        bail!("{route}: declares both a custom and a Cognito authorizer");
    }

    if let Some(auth_type) = spec.authorization_type {
        if auth_type != AuthType::Custom && spec.custom_authorizer.is_some() {
            bail!("{route}: authorization type {auth_type} conflicts with customAuthorizer");
        }
        if auth_type != AuthType::CognitoUserPools && spec.cognito_authorizer.is_some() {
            bail!("{route}: authorization type {auth_type} conflicts with cognitoAuthorizer");
        }
        if auth_type != AuthType::AwsIam
            && spec
                .invoke_with_credentials
                .as_ref()
                .is_some_and(valid_credentials)
        {
            bail!("{route}: invokeWithCredentials requires AWS_IAM authorization, not {auth_type}");
        }
        if auth_type == AuthType::Custom && spec.custom_authorizer.is_none() {
            bail!("{route}: CUSTOM authorization requires a customAuthorizer");
        }
        if auth_type == AuthType::CognitoUserPools && spec.cognito_authorizer.is_none() {
            bail!("{route}: COGNITO_USER_POOLS authorization requires a cognitoAuthorizer");
        }
    }

    if !spec.authorization_scopes.is_empty() && spec.cognito_authorizer.is_none() {
        bail!("{route}: authorizationScopes require a Cognito authorizer");
    }

    if let Some(name) = spec.authorizer_name() {
        if !authorizers.contains_key(name) {
            bail!("{route}: references undeclared authorizer \"{name}\"");
        }
    }

    Ok(())
}

fn validate_authorizer_spec(name: &str, spec: &AuthorizerSpec) -> Result<()> {
    let backends = [
        spec.lambda_name.is_some(),
        spec.lambda_arn.is_some(),
        !spec.provider_arns.is_empty(),
    ];
    let configured = backends.iter().filter(|set| **set).count();
    if configured != 1 {
        bail!(
            "authorizer \"{name}\": exactly one of lambdaName, lambdaArn or providerARNs must be set"
        );
    }
    if spec.lambda_version.is_some() && spec.lambda_name.is_none() {
        bail!("authorizer \"{name}\": lambdaVersion only applies to a lambdaName backend");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RouteMethods, VersionQualifier};

    fn config_with_method(spec: MethodSpec) -> ApiConfig {
        let mut methods = RouteMethods::new();
        methods.insert("GET".to_string(), spec);
        let mut config = ApiConfig::default();
        config.routes.insert("items".to_string(), methods);
        config
    }

    #[test]
    fn accepts_plain_methods() {
        assert!(validate_api_config(&config_with_method(MethodSpec::default())).is_ok());
    }

    #[test]
    fn rejects_custom_authorizer_with_iam_type() {
        let spec = MethodSpec {
            authorization_type: Some(AuthType::AwsIam),
            custom_authorizer: Some("checker".to_string()),
            ..MethodSpec::default()
        };
        let error = validate_api_config(&config_with_method(spec)).unwrap_err();
        assert!(error.to_string().contains("customAuthorizer"));
        assert!(error.to_string().contains("items"));
    }

    #[test]
    fn rejects_credentials_with_non_iam_type() {
        let spec = MethodSpec {
            authorization_type: Some(AuthType::None),
            invoke_with_credentials: Some(InvokeCredentials::CallerAccount(true)),
            ..MethodSpec::default()
        };
        let error = validate_api_config(&config_with_method(spec)).unwrap_err();
        assert!(error.to_string().contains("AWS_IAM"));
    }

    #[test]
    fn rejects_scopes_without_cognito_authorizer() {
        let spec = MethodSpec {
            authorization_scopes: vec!["email".to_string()],
            ..MethodSpec::default()
        };
        let error = validate_api_config(&config_with_method(spec)).unwrap_err();
        assert!(error.to_string().contains("authorizationScopes"));
    }

    #[test]
    fn rejects_undeclared_authorizer_reference() {
        let spec = MethodSpec {
            custom_authorizer: Some("missing".to_string()),
            ..MethodSpec::default()
        };
        let error = validate_api_config(&config_with_method(spec)).unwrap_err();
        assert!(error.to_string().contains("undeclared authorizer"));
    }

    #[test]
    fn rejects_authorizer_with_two_backends() {
        let mut config = ApiConfig::default();
        config.authorizers.insert(
            "checker".to_string(),
            AuthorizerSpec {
                lambda_name: Some("auth".to_string()),
                lambda_arn: Some("arn:aws:lambda:us-east-1:123456789012:function:auth".to_string()),
                ..AuthorizerSpec::default()
            },
        );
        let error = validate_api_config(&config).unwrap_err();
        assert!(error.to_string().contains("exactly one"));
    }

    #[test]
    fn rejects_version_qualifier_without_named_backend() {
        let mut config = ApiConfig::default();
        config.authorizers.insert(
            "checker".to_string(),
            AuthorizerSpec {
                lambda_arn: Some("arn:aws:lambda:us-east-1:123456789012:function:auth".to_string()),
                lambda_version: Some(VersionQualifier::StageAlias(true)),
                ..AuthorizerSpec::default()
            },
        );
        assert!(validate_api_config(&config).is_err());
    }

    #[test]
    fn credential_shapes() {
        assert!(valid_credentials(&InvokeCredentials::CallerAccount(true)));
        assert!(!valid_credentials(&InvokeCredentials::CallerAccount(false)));
        assert!(valid_credentials(&InvokeCredentials::Arn(
            "arn:aws:iam::123456789012:role/invoker".to_string()
        )));
        assert!(valid_credentials(&InvokeCredentials::Arn(
            "arn:aws-cn:sts:::assumed-role/deploy".to_string()
        )));
        assert!(!valid_credentials(&InvokeCredentials::Arn(
            "arn:aws:s3:::bucket/key".to_string()
        )));
        assert!(!valid_credentials(&InvokeCredentials::Arn(
            "not-an-arn".to_string()
        )));
    }
}
