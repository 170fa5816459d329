//! # Gateway Responses
//!
//! Clears gateway response overrides left by earlier runs and applies the
//! config's declared set, so removing an override from the config actually
//! removes it remotely.

use crate::config::GatewayResponseSpec;
use crate::provider::{GatewayApi, GatewayResponseRequest};
use anyhow::Result;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Delete every non-default gateway response of the API.
pub async fn clear_gateway_responses(gateway: &dyn GatewayApi, rest_api_id: &str) -> Result<()> {
    let responses = gateway.get_gateway_responses(rest_api_id).await?;
    for response in responses
        .into_iter()
        .filter(|response| !response.default_response)
    {
        gateway
            .delete_gateway_response(rest_api_id, &response.response_type)
            .await?;
    }
    Ok(())
}

/// Apply the config's gateway response overrides in declaration order.
pub async fn configure_gateway_responses(
    gateway: &dyn GatewayApi,
    rest_api_id: &str,
    responses: &IndexMap<String, GatewayResponseSpec>,
) -> Result<()> {
    for (response_type, spec) in responses {
        gateway
            .put_gateway_response(rest_api_id, build_response_request(response_type, spec))
            .await?;
    }
    Ok(())
}

fn build_response_request(response_type: &str, spec: &GatewayResponseSpec) -> GatewayResponseRequest {
    let mut parameters: BTreeMap<String, String> = spec
        .response_parameters
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    for (header, value) in &spec.headers {
        parameters.insert(format!("gatewayresponse.header.{header}"), format!("'{value}'"));
    }
    GatewayResponseRequest {
        response_type: response_type.to_string(),
        status_code: spec.status_code.map(|code| code.to_string()),
        response_parameters: parameters,
        response_templates: spec
            .response_templates
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
    }
}
