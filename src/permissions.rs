//! # Invoke Permissions
//!
//! Grants the API gateway permission to invoke a function, probing the
//! function's resource policy first so repeated runs do not pile up
//! duplicate statements.

use crate::provider::{LambdaApi, PermissionRequest};
use crate::FunctionTarget;
use anyhow::{Context, Result};
use serde_json::Value;

const INVOKE_ACTION: &str = "lambda:InvokeFunction";
const GATEWAY_PRINCIPAL: &str = "apigateway.amazonaws.com";

/// Allow `rest_api_id` to invoke `function_name`.
///
/// `source_path` narrows the grant within the API (`*/*/*` when `None`,
/// covering every stage/method/path). A statement equivalent to the grant
/// already present in the policy short-circuits; a missing policy counts as
/// no grant.
pub async fn allow_api_invocation(
    lambda: &dyn LambdaApi,
    target: &FunctionTarget,
    rest_api_id: &str,
    function_name: &str,
    qualifier: Option<&str>,
    source_path: Option<&str>,
) -> Result<()> {
    let active_path = source_path.unwrap_or(crate::constants::API_WIDE_SOURCE_PATH);
    let source_arn = format!(
        "arn:{}:execute-api:{}:{}:{}/{}",
        target.partition, target.region, target.account_id, rest_api_id, active_path
    );

    if let Some(policy) = lambda.get_policy(function_name, qualifier).await? {
        let document: Value = serde_json::from_str(&policy)
            .with_context(|| format!("failed to parse policy of function \"{function_name}\""))?;
        let already_granted = document
            .get("Statement")
            .and_then(Value::as_array)
            .is_some_and(|statements| {
                statements
                    .iter()
                    .any(|statement| matches_grant(statement, &source_arn))
            });
        if already_granted {
            return Ok(());
        }
    }

    let statement_id = format!(
        "web-api-access-{}-{}",
        qualifier.unwrap_or("latest"),
        chrono::Utc::now().timestamp_millis()
    );
    lambda
        .add_permission(PermissionRequest {
            function_name: function_name.to_string(),
            qualifier: qualifier.map(str::to_string),
            statement_id,
            action: INVOKE_ACTION.to_string(),
            principal: GATEWAY_PRINCIPAL.to_string(),
            source_arn,
        })
        .await
}

/// Whether a policy statement already grants exactly this invocation.
fn matches_grant(statement: &Value, source_arn: &str) -> bool {
    statement.get("Action").and_then(Value::as_str) == Some(INVOKE_ACTION)
        && statement
            .pointer("/Principal/Service")
            .and_then(Value::as_str)
            == Some(GATEWAY_PRINCIPAL)
        && statement
            .pointer("/Condition/ArnLike/AWS:SourceArn")
            .and_then(Value::as_str)
            == Some(source_arn)
        && statement.get("Effect").and_then(Value::as_str) == Some("Allow")
}
