//! Telemetry initialization and per-invocation span helpers.

use std::time::Instant;

use anyhow::Result;
use tracing::{info, info_span, Span};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// Initialize `tracing` and format developer logs on stderr.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Span helper recording the start and finish of one CLI operation.
pub struct OperationSpan {
    span: Span,
    started_at: Instant,
    invocation_id: Uuid,
    operation: &'static str,
}

impl OperationSpan {
    /// Start an operation span.
    pub fn start(operation: &'static str, region: &str, profile: Option<&str>) -> Self {
        let invocation_id = Uuid::new_v4();
        let span = info_span!(
            target: "machine::ops",
            "operation",
            %invocation_id,
            operation,
            region,
            profile = profile.unwrap_or("")
        );
        Self {
            span,
            started_at: Instant::now(),
            invocation_id,
            operation,
        }
    }

    /// The span to enter while the operation runs.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Close the span while recording the final status.
    pub fn finish(self, status: &'static str) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        info!(
            target: "machine::ops",
            invocation_id = %self.invocation_id,
            operation = self.operation,
            status = status,
            elapsed_ms = elapsed_ms,
            "Completed operation"
        );
    }
}
