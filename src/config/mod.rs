//! # Declarative API Configuration
//!
//! The full declarative unit a reconciliation run consumes: route table,
//! authorizer map, CORS policy, custom gateway responses and binary media
//! types. The model is immutable during a run, and its canonical JSON
//! serialization is the input of the config signature, so field order and
//! map ordering here are load-bearing.
//!
//! Route and authorizer maps keep declaration order: paths are reconciled in
//! the order they appear, and authorizers are created in map key order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

mod validation;

pub use validation::{is_credential_arn, valid_credentials, validate_api_config};

/// Config schema version; folded into the signature through serialization.
pub const SCHEMA_VERSION: u32 = 3;

/// Methods declared on one route path, keyed by upper-case HTTP method name.
pub type RouteMethods = IndexMap<String, MethodSpec>;

/// The full declarative unit of one reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConfig {
    pub version: u32,
    /// Logical path (no leading slash, `{param}`/`{param+}` segments allowed)
    /// to its declared methods.
    pub routes: IndexMap<String, RouteMethods>,
    pub authorizers: IndexMap<String, AuthorizerSpec>,
    pub cors_handlers: CorsPolicy,
    /// Allow-Origin value for synthesized handlers; `*` when unset.
    pub cors_origin: Option<String>,
    pub cors_max_age: Option<u64>,
    /// Gateway response overrides keyed by response type, e.g. `DEFAULT_4XX`.
    pub custom_responses: IndexMap<String, GatewayResponseSpec>,
    pub binary_media_types: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            routes: IndexMap::new(),
            authorizers: IndexMap::new(),
            cors_handlers: CorsPolicy::default(),
            cors_origin: None,
            cors_max_age: None,
            custom_responses: IndexMap::new(),
            binary_media_types: Vec::new(),
        }
    }
}

/// Behavior of one `(path, method)` route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MethodSpec {
    /// Explicit authorization type; derived from the other fields when unset.
    pub authorization_type: Option<AuthType>,
    pub custom_authorizer: Option<String>,
    pub cognito_authorizer: Option<String>,
    pub api_key_required: bool,
    pub invoke_with_credentials: Option<InvokeCredentials>,
    pub authorization_scopes: Vec<String>,
    pub request_parameters: Option<IndexMap<String, RequestParameter>>,
    pub request_content_handling: Option<ContentHandling>,
    pub success: Option<ResponseSpec>,
    pub error: Option<ResponseSpec>,
}

impl MethodSpec {
    /// Name of the authorizer this method references, if any.
    #[must_use]
    pub fn authorizer_name(&self) -> Option<&str> {
        self.custom_authorizer
            .as_deref()
            .or(self.cognito_authorizer.as_deref())
    }
}

/// Method authorization types accepted by the control-plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthType {
    None,
    AwsIam,
    Custom,
    CognitoUserPools,
}

impl AuthType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::AwsIam => "AWS_IAM",
            Self::Custom => "CUSTOM",
            Self::CognitoUserPools => "COGNITO_USER_POOLS",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IAM credentials attached to a route's integration.
///
/// `true` grants any IAM principal; a string must be an IAM/STS ARN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvokeCredentials {
    CallerAccount(bool),
    Arn(String),
}

/// One request-parameter declaration: either a plain required flag, or a
/// class of parameters (`header`, `querystring`, ...) each with its own flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestParameter {
    Required(bool),
    Class(IndexMap<String, bool>),
}

/// Payload conversion applied by an integration or integration response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentHandling {
    ConvertToBinary,
    ConvertToText,
}

impl ContentHandling {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConvertToBinary => "CONVERT_TO_BINARY",
            Self::ConvertToText => "CONVERT_TO_TEXT",
        }
    }
}

/// Shape of a method's success or error response pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseSpec {
    /// Defaults to 200 for success and 500 for error responses.
    pub status_code: Option<u16>,
    /// Static header values emitted with the response.
    pub headers: IndexMap<String, String>,
    pub content_handling: Option<ContentHandling>,
}

/// One named authorizer.
///
/// Exactly one backend source must be configured: a function name (optionally
/// version-qualified), a direct function ARN, or Cognito provider ARNs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizerSpec {
    pub lambda_name: Option<String>,
    pub lambda_version: Option<VersionQualifier>,
    pub lambda_arn: Option<String>,
    #[serde(rename = "providerARNs", alias = "providerArns")]
    pub provider_arns: Vec<String>,
    #[serde(rename = "type")]
    pub authorizer_type: Option<AuthorizerType>,
    /// Header carrying the identity, used when `identity_source` is unset.
    pub header_name: Option<String>,
    pub identity_source: Option<String>,
    pub validation_expression: Option<String>,
    pub credentials: Option<String>,
    pub result_ttl: Option<u32>,
}

/// Authorizer types accepted by the control-plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizerType {
    Token,
    Request,
    CognitoUserPools,
}

impl AuthorizerType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "TOKEN",
            Self::Request => "REQUEST",
            Self::CognitoUserPools => "COGNITO_USER_POOLS",
        }
    }
}

/// Version qualifier appended to an authorizer backend looked up by name.
///
/// `true` late-binds the qualifier to the stage's `lambdaVersion` variable;
/// a string pins a literal version or alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionQualifier {
    StageAlias(bool),
    Version(String),
}

/// Config-level CORS policy.
///
/// `true` (the default) synthesizes mock OPTIONS handlers, `false` disables
/// synthesis entirely, and a custom header string routes OPTIONS to the
/// function instead, since custom header values imply custom handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorsPolicy {
    Enabled(bool),
    Headers(String),
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

impl CorsPolicy {
    /// Whether OPTIONS handlers are synthesized at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }

    /// Whether synthesized handlers answer from a zero-backend mock.
    #[must_use]
    pub fn uses_mock_integration(&self) -> bool {
        matches!(self, Self::Enabled(true))
    }
}

/// Override for one gateway response type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayResponseSpec {
    pub status_code: Option<u16>,
    pub response_parameters: IndexMap<String, String>,
    pub response_templates: IndexMap<String, String>,
    /// Convenience form; expanded to quoted `gatewayresponse.header.*` entries.
    pub headers: IndexMap<String, String>,
}
