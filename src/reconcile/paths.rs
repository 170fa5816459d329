//! # Path Resolution
//!
//! Maps logical `/`-delimited paths onto remote resource ids, creating
//! missing intermediate resources parent-before-child. The memo is owned by
//! one reconciliation run; seeding it from the remote listing once up front
//! means pre-existing resources are reused instead of recreated, and any
//! path is created at most once per run no matter how many routes share it.

use crate::provider::GatewayApi;
use anyhow::{bail, Result};
use std::collections::HashMap;

/// Split a logical path into `(parent, last_segment)`.
///
/// A leading `/` is ignored; the root splits into `("", "")`.
#[must_use]
pub fn split_path(path: &str) -> (&str, &str) {
    let path = path.strip_prefix('/').unwrap_or(path);
    match path.rfind('/') {
        Some(index) => (&path[..index], &path[index + 1..]),
        None => ("", path),
    }
}

/// Path → resource-id memo for one reconciliation run.
#[derive(Debug, Default)]
pub struct PathResolver {
    known_ids: HashMap<String, String>,
}

impl PathResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the memo from the remote resource listing. Paths are keyed with
    /// the leading separator stripped, so the root lands under `""`.
    pub async fn seed(&mut self, gateway: &dyn GatewayApi, rest_api_id: &str) -> Result<()> {
        for resource in gateway.get_resources(rest_api_id).await? {
            self.known_ids.insert(
                resource.path.trim_start_matches('/').to_string(),
                resource.id,
            );
        }
        Ok(())
    }

    /// Resolve a path to its resource id, creating missing ancestors first.
    pub async fn resolve(
        &mut self,
        gateway: &dyn GatewayApi,
        rest_api_id: &str,
        path: &str,
    ) -> Result<String> {
        let normalized = path.strip_prefix('/').unwrap_or(path);
        if let Some(id) = self.known_ids.get(normalized) {
            return Ok(id.clone());
        }

        // Walk up to the nearest known ancestor, then create back down.
        let mut missing = vec![normalized];
        let mut ancestor = split_path(normalized).0;
        while !self.known_ids.contains_key(ancestor) {
            if ancestor.is_empty() {
                bail!("root resource is unknown; the resource tree was not seeded");
            }
            missing.push(ancestor);
            ancestor = split_path(ancestor).0;
        }

        let mut parent_id = self.known_ids[ancestor].clone();
        for pending in missing.into_iter().rev() {
            let (_, segment) = split_path(pending);
            let id = gateway
                .create_resource(rest_api_id, &parent_id, segment)
                .await?;
            self.known_ids.insert(pending.to_string(), id.clone());
            parent_id = id;
        }
        Ok(parent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::split_path;

    #[test]
    fn splits_last_segment() {
        assert_eq!(split_path("items/{id}/tags"), ("items/{id}", "tags"));
        assert_eq!(split_path("items"), ("", "items"));
    }

    #[test]
    fn strips_a_leading_separator() {
        assert_eq!(split_path("/items/{id}"), ("items", "{id}"));
    }

    #[test]
    fn root_splits_into_empty_parts() {
        assert_eq!(split_path(""), ("", ""));
        assert_eq!(split_path("/"), ("", ""));
    }
}
