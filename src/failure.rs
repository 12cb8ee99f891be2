//! Stock failure handlers.

use crate::error::ConsumerFailure;
use crate::types::FailureHandler;
use std::fmt::Debug;
use tracing::warn;

/// Reports consumer failures through `tracing` at `WARN` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingFailureHandler;

impl<R: Debug> FailureHandler<R> for LoggingFailureHandler {
    fn on_failure(&self, failure: ConsumerFailure, resource: R) {
        warn!(
            resource = ?resource,
            panicked = failure.is_panic(),
            error = %failure,
            "Consumer failed while handling resource"
        );
    }
}

/// Discards consumer failures.
#[derive(Clone, Copy, Debug, Default)]
pub struct IgnoreFailures;

impl<R> FailureHandler<R> for IgnoreFailures {
    fn on_failure(&self, _failure: ConsumerFailure, _resource: R) {}
}
