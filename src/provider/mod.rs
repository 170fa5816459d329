//! # Control-Plane Providers
//!
//! Typed seams over the two remote control-planes a run mutates: the API
//! gateway (resource tree, methods, integrations, responses, authorizers,
//! stages) and the function service (ARN lookup, resource-policy grants).
//!
//! The engine only ever talks to these traits; the AWS implementations in
//! [`aws`] add throttle retries and per-call logging, and tests substitute
//! in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

pub mod aws;

/// One node of the remote resource tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItem {
    pub id: String,
    /// Full path, with the leading `/` as reported by the control-plane.
    pub path: String,
}

/// One remote authorizer, as listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizerItem {
    pub id: String,
    pub name: String,
}

/// One gateway response, as listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponseItem {
    pub response_type: String,
    /// Whether this is the control-plane's own default rather than an override.
    pub default_response: bool,
}

/// Arguments for registering a method on a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodRequest {
    pub resource_id: String,
    pub http_method: String,
    pub authorization_type: String,
    pub authorizer_id: Option<String>,
    pub request_parameters: BTreeMap<String, bool>,
    pub api_key_required: bool,
    pub authorization_scopes: Vec<String>,
}

/// Backend bound to a resource + method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationKind {
    /// Forward the whole request to the target function.
    Proxy {
        uri: String,
        credentials: Option<String>,
        cache_key_parameters: Vec<String>,
        content_handling: Option<String>,
    },
    /// Answer statically without any backend.
    Mock,
}

/// Arguments for binding an integration to a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationRequest {
    pub resource_id: String,
    pub http_method: String,
    pub kind: IntegrationKind,
}

/// Arguments for declaring a method response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodResponseRequest {
    pub resource_id: String,
    pub http_method: String,
    pub status_code: String,
    /// Header declarations; values are filled by the integration response.
    pub response_parameters: BTreeMap<String, bool>,
}

/// Arguments for declaring an integration response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrationResponseRequest {
    pub resource_id: String,
    pub http_method: String,
    pub status_code: String,
    pub response_parameters: BTreeMap<String, String>,
    pub content_handling: Option<String>,
}

/// Arguments for creating an authorizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizerRequest {
    pub name: String,
    pub authorizer_type: String,
    pub identity_source: String,
    pub authorizer_uri: Option<String>,
    pub provider_arns: Vec<String>,
    pub identity_validation_expression: Option<String>,
    pub credentials: Option<String>,
    pub result_ttl_seconds: Option<u32>,
}

/// Arguments for configuring a gateway response override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayResponseRequest {
    pub response_type: String,
    pub status_code: Option<String>,
    pub response_parameters: BTreeMap<String, String>,
    pub response_templates: BTreeMap<String, String>,
}

/// Arguments for granting the gateway permission to invoke a function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionRequest {
    pub function_name: String,
    pub qualifier: Option<String>,
    pub statement_id: String,
    pub action: String,
    pub principal: String,
    pub source_arn: String,
}

/// Operations the engine needs from the API gateway control-plane.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// List the resource tree (single page, bounded by the engine's limit).
    async fn get_resources(&self, rest_api_id: &str) -> Result<Vec<ResourceItem>>;

    /// Create a child resource and return its id.
    async fn create_resource(
        &self,
        rest_api_id: &str,
        parent_id: &str,
        path_part: &str,
    ) -> Result<String>;

    async fn put_method(&self, rest_api_id: &str, request: MethodRequest) -> Result<()>;

    async fn put_integration(&self, rest_api_id: &str, request: IntegrationRequest) -> Result<()>;

    async fn put_method_response(
        &self,
        rest_api_id: &str,
        request: MethodResponseRequest,
    ) -> Result<()>;

    async fn put_integration_response(
        &self,
        rest_api_id: &str,
        request: IntegrationResponseRequest,
    ) -> Result<()>;

    async fn get_authorizers(&self, rest_api_id: &str) -> Result<Vec<AuthorizerItem>>;

    async fn delete_authorizer(&self, rest_api_id: &str, authorizer_id: &str) -> Result<()>;

    /// Create an authorizer and return its id.
    async fn create_authorizer(
        &self,
        rest_api_id: &str,
        request: AuthorizerRequest,
    ) -> Result<String>;

    async fn get_gateway_responses(&self, rest_api_id: &str) -> Result<Vec<GatewayResponseItem>>;

    async fn delete_gateway_response(&self, rest_api_id: &str, response_type: &str) -> Result<()>;

    async fn put_gateway_response(
        &self,
        rest_api_id: &str,
        request: GatewayResponseRequest,
    ) -> Result<()>;

    /// Read a stage's variables; `None` when the stage does not exist yet.
    async fn get_stage_variables(
        &self,
        rest_api_id: &str,
        stage_name: &str,
    ) -> Result<Option<HashMap<String, String>>>;

    async fn create_deployment(
        &self,
        rest_api_id: &str,
        stage_name: &str,
        variables: HashMap<String, String>,
    ) -> Result<()>;

    /// Create a fresh REST API and return its id.
    async fn create_rest_api(&self, name: &str, binary_media_types: &[String]) -> Result<String>;
}

/// Operations the engine needs from the function control-plane.
#[async_trait]
pub trait LambdaApi: Send + Sync {
    /// Resolve a function name to its unqualified ARN.
    async fn get_function_arn(&self, function_name: &str) -> Result<String>;

    /// Read the function's resource policy document; `None` when the
    /// function or qualifier has no policy yet.
    async fn get_policy(
        &self,
        function_name: &str,
        qualifier: Option<&str>,
    ) -> Result<Option<String>>;

    async fn add_permission(&self, request: PermissionRequest) -> Result<()>;
}
