//! # Config Signature
//!
//! Content hash of the declarative config, persisted as a stage variable to
//! detect no-op redeploys. Serialization goes through the config model, so
//! two semantically identical configs (one spelling defaults out, one
//! omitting them) hash identically, and the schema version participates in
//! the digest like any other field.

use crate::config::ApiConfig;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// SHA-256 of the canonical JSON form, base64-encoded with `+` swapped for
/// `-` so the value stays safe inside stage variables.
pub fn config_signature(config: &ApiConfig) -> Result<String> {
    let serialized =
        serde_json::to_string(config).context("failed to serialize the API config")?;
    let digest = Sha256::digest(serialized.as_bytes());
    Ok(STANDARD.encode(digest).replace('+', "-"))
}
