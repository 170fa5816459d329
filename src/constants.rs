//! # Constants
//!
//! Shared constants used throughout the reconciliation engine.

use std::time::Duration;

/// Default delay between retries of a throttled control-plane call
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// Default total attempt budget for a throttled control-plane call
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 10;

/// Page limit for the one-shot resource listing that seeds the path memo
pub const RESOURCE_PAGE_LIMIT: i32 = 499;

/// Page limit when listing authorizers for wholesale replacement
pub const AUTHORIZER_PAGE_LIMIT: i32 = 500;

/// Page limit when listing gateway responses for clearing
pub const GATEWAY_RESPONSE_PAGE_LIMIT: i32 = 500;

/// Stage variable carrying the function version/alias a stage invokes
pub const STAGE_VARIABLE_FUNCTION_VERSION: &str = "lambdaVersion";

/// Source-path wildcard granting invocation from every route of an API
pub const API_WIDE_SOURCE_PATH: &str = "*/*/*";

/// Source path granting invocation from an API's authorizers only
pub const AUTHORIZER_SOURCE_PATH: &str = "authorizers/*";

/// Header sent by clients to select an authorizer identity, unless overridden
pub const DEFAULT_IDENTITY_HEADER: &str = "Authorization";

/// Allow-Headers value emitted by synthesized mock CORS handlers
pub const DEFAULT_CORS_ALLOWED_HEADERS: &str =
    "Content-Type,Authorization,X-Amz-Date,X-Api-Key,X-Amz-Security-Token";

/// Response headers a synthesized mock CORS handler declares on its 200
pub const CORS_RESPONSE_HEADERS: [&str; 5] = [
    "Access-Control-Allow-Headers",
    "Access-Control-Allow-Methods",
    "Access-Control-Allow-Origin",
    "Access-Control-Allow-Credentials",
    "Access-Control-Max-Age",
];
