//! Web API Reconciler Library
//!
//! Deploys Lambda-backed REST APIs by reconciling a declarative route table
//! against the Amazon API Gateway control-plane.
//!
//! The engine:
//! - Validates the declarative config before touching the control-plane
//! - Skips the whole run when a stored config signature matches (no-op redeploy)
//! - Materializes the resource tree lazily, parents before children
//! - Attaches methods, proxy integrations and response pairs per route
//! - Synthesizes OPTIONS CORS handlers where routes do not declare their own
//! - Replaces the authorizer set wholesale and grants invoke permissions
//! - Commits a stage deployment carrying the function alias and signature
//!
//! All remote calls are issued sequentially; the control-plane enforces
//! ordering (parents before children, methods before integrations) and a low
//! concurrent-mutation rate per API.

use thiserror::Error;

pub mod config;
pub mod constants;
pub mod identity;
pub mod logger;
pub mod permissions;
pub mod provider;
pub mod proxy;
pub mod reconcile;
pub mod retry;
pub mod url;

pub use config::ApiConfig;
pub use identity::{get_own_info, OwnInfo};
pub use logger::{ConsoleLogger, DeployLogger, NullLogger};
pub use proxy::{deploy_proxy_api, DeployedApi};
pub use reconcile::{rebuild_web_api, RebuildOutcome};
pub use url::stage_invoke_url;

/// Identity of the deployed function an API fronts.
///
/// Produced by the command layer from the function's metadata plus the
/// caller identity discovered via [`get_own_info`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionTarget {
    pub function_name: String,
    /// Version or alias the stage deploys; also the stage name.
    pub function_version: String,
    pub account_id: String,
    pub partition: String,
    pub region: String,
}

impl FunctionTarget {
    /// Proxy integration URI for the target function.
    ///
    /// The version segment stays late-bound as a stage variable so the same
    /// resource tree serves every stage of the API.
    #[must_use]
    pub fn invocation_uri(&self) -> String {
        format!(
            "arn:{partition}:apigateway:{region}:lambda:path/2015-03-31/functions/arn:{partition}:lambda:{region}:{account}:function:{name}:${{stageVariables.lambdaVersion}}/invocations",
            partition = self.partition,
            region = self.region,
            account = self.account_id,
            name = self.function_name,
        )
    }

    /// Invocation URI for an authorizer backend resolved to a concrete ARN.
    #[must_use]
    pub fn authorizer_invocation_uri(&self, function_arn: &str) -> String {
        format!(
            "arn:{}:apigateway:{}:lambda:path/2015-03-31/functions/{}/invocations",
            self.partition, self.region, function_arn
        )
    }
}

/// Top-level failure of a reconciliation run.
///
/// Validation rejections are raised before any remote call; everything else
/// aborts the run with the first fatal remote error.
#[derive(Debug, Error)]
pub enum WebApiError {
    #[error("invalid API configuration: {0}")]
    Validation(#[source] anyhow::Error),
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::FunctionTarget;

    fn target() -> FunctionTarget {
        FunctionTarget {
            function_name: "orders".to_string(),
            function_version: "prod".to_string(),
            account_id: "123456789012".to_string(),
            partition: "aws".to_string(),
            region: "eu-west-1".to_string(),
        }
    }

    #[test]
    fn invocation_uri_keeps_version_late_bound() {
        assert_eq!(
            target().invocation_uri(),
            "arn:aws:apigateway:eu-west-1:lambda:path/2015-03-31/functions/arn:aws:lambda:eu-west-1:123456789012:function:orders:${stageVariables.lambdaVersion}/invocations"
        );
    }

    #[test]
    fn authorizer_uri_wraps_resolved_arn() {
        let uri = target().authorizer_invocation_uri(
            "arn:aws:lambda:eu-west-1:123456789012:function:auth:5",
        );
        assert_eq!(
            uri,
            "arn:aws:apigateway:eu-west-1:lambda:path/2015-03-31/functions/arn:aws:lambda:eu-west-1:123456789012:function:auth:5/invocations"
        );
    }
}
