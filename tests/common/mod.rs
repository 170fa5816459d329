//! Shared fakes for driving the reconciliation engine without AWS.

#![allow(dead_code, reason = "helpers are shared across test binaries")]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use web_api_reconciler::logger::DeployLogger;
use web_api_reconciler::provider::{
    AuthorizerItem, AuthorizerRequest, GatewayApi, GatewayResponseItem, GatewayResponseRequest,
    IntegrationRequest, IntegrationResponseRequest, LambdaApi, MethodRequest,
    MethodResponseRequest, PermissionRequest, ResourceItem,
};
use web_api_reconciler::FunctionTarget;

pub fn target() -> FunctionTarget {
    FunctionTarget {
        function_name: "orders".to_string(),
        function_version: "prod".to_string(),
        account_id: "123456789012".to_string(),
        partition: "aws".to_string(),
        region: "eu-west-1".to_string(),
    }
}

#[derive(Debug, Default)]
pub struct GatewayState {
    /// Resources reported by the listing that seeds the path memo.
    pub seeded_resources: Vec<ResourceItem>,
    /// `(parent_id, path_part)` per creation call.
    pub created_resources: Vec<(String, String)>,
    pub methods: Vec<MethodRequest>,
    pub integrations: Vec<IntegrationRequest>,
    pub method_responses: Vec<MethodResponseRequest>,
    pub integration_responses: Vec<IntegrationResponseRequest>,
    pub existing_authorizers: Vec<AuthorizerItem>,
    pub deleted_authorizers: Vec<String>,
    pub created_authorizers: Vec<AuthorizerRequest>,
    pub existing_gateway_responses: Vec<GatewayResponseItem>,
    pub deleted_gateway_responses: Vec<String>,
    pub configured_gateway_responses: Vec<GatewayResponseRequest>,
    /// `None` simulates a stage that does not exist yet.
    pub stage_variables: Option<HashMap<String, String>>,
    /// `(stage_name, variables)` per deployment.
    pub deployments: Vec<(String, HashMap<String, String>)>,
    pub created_apis: Vec<String>,
    /// Every call in order, for zero-work assertions.
    pub calls: Vec<String>,
    next_id: u32,
}

#[derive(Debug, Default)]
pub struct FakeGateway {
    pub state: Mutex<GatewayState>,
}

impl FakeGateway {
    /// A gateway whose resource tree holds only the root.
    pub fn new() -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().seeded_resources.push(ResourceItem {
            id: "root".to_string(),
            path: "/".to_string(),
        });
        fake
    }

    pub fn with_existing_authorizers(self, authorizers: Vec<AuthorizerItem>) -> Self {
        self.state.lock().unwrap().existing_authorizers = authorizers;
        self
    }

    pub fn with_stage_variables(self, variables: HashMap<String, String>) -> Self {
        self.state.lock().unwrap().stage_variables = Some(variables);
        self
    }

    pub fn with_existing_gateway_responses(self, responses: Vec<GatewayResponseItem>) -> Self {
        self.state.lock().unwrap().existing_gateway_responses = responses;
        self
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

#[async_trait]
impl GatewayApi for FakeGateway {
    async fn get_resources(&self, _rest_api_id: &str) -> Result<Vec<ResourceItem>> {
        self.record("getResources");
        Ok(self.state.lock().unwrap().seeded_resources.clone())
    }

    async fn create_resource(
        &self,
        _rest_api_id: &str,
        parent_id: &str,
        path_part: &str,
    ) -> Result<String> {
        self.record("createResource");
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("res-{}", state.next_id);
        state
            .created_resources
            .push((parent_id.to_string(), path_part.to_string()));
        Ok(id)
    }

    async fn put_method(&self, _rest_api_id: &str, request: MethodRequest) -> Result<()> {
        self.record("putMethod");
        self.state.lock().unwrap().methods.push(request);
        Ok(())
    }

    async fn put_integration(
        &self,
        _rest_api_id: &str,
        request: IntegrationRequest,
    ) -> Result<()> {
        self.record("putIntegration");
        self.state.lock().unwrap().integrations.push(request);
        Ok(())
    }

    async fn put_method_response(
        &self,
        _rest_api_id: &str,
        request: MethodResponseRequest,
    ) -> Result<()> {
        self.record("putMethodResponse");
        self.state.lock().unwrap().method_responses.push(request);
        Ok(())
    }

    async fn put_integration_response(
        &self,
        _rest_api_id: &str,
        request: IntegrationResponseRequest,
    ) -> Result<()> {
        self.record("putIntegrationResponse");
        self.state
            .lock()
            .unwrap()
            .integration_responses
            .push(request);
        Ok(())
    }

    async fn get_authorizers(&self, _rest_api_id: &str) -> Result<Vec<AuthorizerItem>> {
        self.record("getAuthorizers");
        Ok(self.state.lock().unwrap().existing_authorizers.clone())
    }

    async fn delete_authorizer(&self, _rest_api_id: &str, authorizer_id: &str) -> Result<()> {
        self.record("deleteAuthorizer");
        self.state
            .lock()
            .unwrap()
            .deleted_authorizers
            .push(authorizer_id.to_string());
        Ok(())
    }

    async fn create_authorizer(
        &self,
        _rest_api_id: &str,
        request: AuthorizerRequest,
    ) -> Result<String> {
        self.record("createAuthorizer");
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("authorizer-{}", state.next_id);
        state.created_authorizers.push(request);
        Ok(id)
    }

    async fn get_gateway_responses(
        &self,
        _rest_api_id: &str,
    ) -> Result<Vec<GatewayResponseItem>> {
        self.record("getGatewayResponses");
        Ok(self.state.lock().unwrap().existing_gateway_responses.clone())
    }

    async fn delete_gateway_response(
        &self,
        _rest_api_id: &str,
        response_type: &str,
    ) -> Result<()> {
        self.record("deleteGatewayResponse");
        self.state
            .lock()
            .unwrap()
            .deleted_gateway_responses
            .push(response_type.to_string());
        Ok(())
    }

    async fn put_gateway_response(
        &self,
        _rest_api_id: &str,
        request: GatewayResponseRequest,
    ) -> Result<()> {
        self.record("putGatewayResponse");
        self.state
            .lock()
            .unwrap()
            .configured_gateway_responses
            .push(request);
        Ok(())
    }

    async fn get_stage_variables(
        &self,
        _rest_api_id: &str,
        _stage_name: &str,
    ) -> Result<Option<HashMap<String, String>>> {
        self.record("getStage");
        Ok(self.state.lock().unwrap().stage_variables.clone())
    }

    async fn create_deployment(
        &self,
        _rest_api_id: &str,
        stage_name: &str,
        variables: HashMap<String, String>,
    ) -> Result<()> {
        self.record("createDeployment");
        let mut state = self.state.lock().unwrap();
        // Deploying materializes the stage with these variables.
        state.stage_variables = Some(variables.clone());
        state
            .deployments
            .push((stage_name.to_string(), variables));
        Ok(())
    }

    async fn create_rest_api(
        &self,
        name: &str,
        _binary_media_types: &[String],
    ) -> Result<String> {
        self.record("createRestApi");
        self.state.lock().unwrap().created_apis.push(name.to_string());
        Ok("api-new".to_string())
    }
}

#[derive(Debug, Default)]
pub struct LambdaState {
    /// Resource policies keyed by function name.
    pub policies: HashMap<String, String>,
    pub permissions: Vec<PermissionRequest>,
    pub calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeLambda {
    pub state: Mutex<LambdaState>,
}

impl FakeLambda {
    pub fn with_policy(self, function_name: &str, policy: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .policies
            .insert(function_name.to_string(), policy.to_string());
        self
    }
}

#[async_trait]
impl LambdaApi for FakeLambda {
    async fn get_function_arn(&self, function_name: &str) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push("getFunctionConfiguration".to_string());
        Ok(format!(
            "arn:aws:lambda:eu-west-1:123456789012:function:{function_name}"
        ))
    }

    async fn get_policy(
        &self,
        function_name: &str,
        _qualifier: Option<&str>,
    ) -> Result<Option<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("getPolicy".to_string());
        Ok(state.policies.get(function_name).cloned())
    }

    async fn add_permission(&self, request: PermissionRequest) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("addPermission".to_string());
        state.permissions.push(request);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingLogger {
    pub stages: Mutex<Vec<String>>,
    pub api_calls: Mutex<Vec<String>>,
}

impl DeployLogger for RecordingLogger {
    fn log_stage(&self, stage: &str) {
        self.stages.lock().unwrap().push(stage.to_string());
    }

    fn log_api_call(&self, call: &str, args: &str) {
        self.api_calls
            .lock()
            .unwrap()
            .push(format!("{call} {args}"));
    }
}
