//! # Caller Identity
//!
//! Resolves the deploying account id and ARN partition once per invocation;
//! both feed into every ARN the engine constructs.

use crate::logger::DeployLogger;
use anyhow::{Context, Result};

/// Account id and partition of the credentials driving a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnInfo {
    pub account_id: String,
    pub partition: String,
}

/// Look up the caller identity via STS. The partition comes from the second
/// field of the caller ARN, so GovCloud and China partitions resolve
/// correctly without configuration.
pub async fn get_own_info(sts: &aws_sdk_sts::Client, logger: &dyn DeployLogger) -> Result<OwnInfo> {
    logger.log_api_call("sts.getCallerIdentity", "");
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("failed to resolve caller identity")?;

    let account_id = identity
        .account
        .context("caller identity carries no account id")?;
    let arn = identity.arn.context("caller identity carries no ARN")?;
    let partition = parse_partition(&arn)
        .with_context(|| format!("caller ARN \"{arn}\" has no partition"))?
        .to_string();

    Ok(OwnInfo {
        account_id,
        partition,
    })
}

fn parse_partition(arn: &str) -> Option<&str> {
    arn.split(':').nth(1).filter(|partition| !partition.is_empty())
}

#[cfg(test)]
mod tests {
    use super::parse_partition;

    #[test]
    fn partition_comes_from_the_second_arn_field() {
        assert_eq!(
            parse_partition("arn:aws:iam::123456789012:user/deploy"),
            Some("aws")
        );
        assert_eq!(
            parse_partition("arn:aws-us-gov:sts::123456789012:assumed-role/ops/session"),
            Some("aws-us-gov")
        );
    }

    #[test]
    fn malformed_arns_yield_nothing() {
        assert_eq!(parse_partition("not-an-arn"), None);
        assert_eq!(parse_partition("arn::iam::123456789012:user/x"), None);
    }
}
