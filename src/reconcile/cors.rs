//! # CORS Synthesis
//!
//! Derives an OPTIONS handler per resource from the config-level CORS
//! policy. Routes that declare their own OPTIONS method are never touched
//! here; the driver skips synthesis for them entirely.

use crate::config::ApiConfig;
use crate::constants::{CORS_RESPONSE_HEADERS, DEFAULT_CORS_ALLOWED_HEADERS};
use crate::provider::{
    GatewayApi, IntegrationKind, IntegrationRequest, IntegrationResponseRequest, MethodRequest,
    MethodResponseRequest,
};
use crate::FunctionTarget;
use anyhow::Result;
use std::collections::BTreeMap;

/// Register a synthesized OPTIONS handler on one resource.
///
/// The default policy answers from a zero-backend mock carrying the standard
/// CORS headers; a custom-headers policy routes OPTIONS to the function
/// instead and leaves header emission to the backend.
pub async fn create_cors_handler(
    gateway: &dyn GatewayApi,
    rest_api_id: &str,
    target: &FunctionTarget,
    config: &ApiConfig,
    resource_id: &str,
    supported_methods: &[String],
) -> Result<()> {
    let mock = config.cors_handlers.uses_mock_integration();

    gateway
        .put_method(
            rest_api_id,
            MethodRequest {
                resource_id: resource_id.to_string(),
                http_method: "OPTIONS".to_string(),
                authorization_type: "NONE".to_string(),
                ..MethodRequest::default()
            },
        )
        .await?;

    let kind = if mock {
        IntegrationKind::Mock
    } else {
        IntegrationKind::Proxy {
            uri: target.invocation_uri(),
            credentials: None,
            cache_key_parameters: Vec::new(),
            content_handling: None,
        }
    };
    gateway
        .put_integration(
            rest_api_id,
            IntegrationRequest {
                resource_id: resource_id.to_string(),
                http_method: "OPTIONS".to_string(),
                kind,
            },
        )
        .await?;

    let declared = if mock {
        CORS_RESPONSE_HEADERS
            .iter()
            .map(|header| (format!("method.response.header.{header}"), false))
            .collect()
    } else {
        BTreeMap::new()
    };
    gateway
        .put_method_response(
            rest_api_id,
            MethodResponseRequest {
                resource_id: resource_id.to_string(),
                http_method: "OPTIONS".to_string(),
                status_code: "200".to_string(),
                response_parameters: declared,
            },
        )
        .await?;

    let values = if mock {
        mock_response_values(config, supported_methods)
    } else {
        BTreeMap::new()
    };
    gateway
        .put_integration_response(
            rest_api_id,
            IntegrationResponseRequest {
                resource_id: resource_id.to_string(),
                http_method: "OPTIONS".to_string(),
                status_code: "200".to_string(),
                response_parameters: values,
                content_handling: None,
            },
        )
        .await
}

fn mock_response_values(
    config: &ApiConfig,
    supported_methods: &[String],
) -> BTreeMap<String, String> {
    let mut methods: Vec<&str> = supported_methods.iter().map(String::as_str).collect();
    methods.sort_unstable();

    let mut values = BTreeMap::new();
    values.insert(
        "method.response.header.Access-Control-Allow-Methods".to_string(),
        format!("'OPTIONS,{}'", methods.join(",")),
    );
    values.insert(
        "method.response.header.Access-Control-Allow-Origin".to_string(),
        format!("'{}'", config.cors_origin.as_deref().unwrap_or("*")),
    );
    values.insert(
        "method.response.header.Access-Control-Allow-Credentials".to_string(),
        "'true'".to_string(),
    );
    values.insert(
        "method.response.header.Access-Control-Allow-Headers".to_string(),
        format!("'{DEFAULT_CORS_ALLOWED_HEADERS}'"),
    );
    if let Some(max_age) = config.cors_max_age {
        values.insert(
            "method.response.header.Access-Control-Max-Age".to_string(),
            format!("'{max_age}'"),
        );
    }
    values
}
