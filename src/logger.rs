//! # Deployment Logging
//!
//! Progress reporting for a reconciliation run: coarse stage transitions and
//! one line per remote control-plane call. The engine takes the logger as a
//! trait object so command layers can substitute their own reporting.

use tracing::{debug, info};

/// Progress sink for a reconciliation run.
pub trait DeployLogger: Send + Sync {
    /// Record a phase transition, e.g. "registering authorizers".
    fn log_stage(&self, stage: &str);

    /// Record a remote call as `service.method` plus a short argument summary,
    /// emitted before the call executes.
    fn log_api_call(&self, call: &str, args: &str);
}

/// Logger that forwards progress to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLogger;

impl DeployLogger for ConsoleLogger {
    fn log_stage(&self, stage: &str) {
        info!("{stage}");
    }

    fn log_api_call(&self, call: &str, args: &str) {
        if args.is_empty() {
            debug!("{call}");
        } else {
            debug!("{call}\t{args}");
        }
    }
}

/// Logger that discards everything; the default when a caller passes none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl DeployLogger for NullLogger {
    fn log_stage(&self, _stage: &str) {}

    fn log_api_call(&self, _call: &str, _args: &str) {}
}
