//! Public URL of a deployed stage.

/// `https://{api}.execute-api.{region}.amazonaws.com/{stage}`
#[must_use]
pub fn stage_invoke_url(api_id: &str, region: &str, stage: &str) -> String {
    format!("https://{api_id}.execute-api.{region}.amazonaws.com/{stage}")
}
