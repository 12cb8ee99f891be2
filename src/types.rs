//! Core capability traits: consumers and failure handlers.

use crate::error::{BoxError, ConsumerFailure};

/// What a consumer returns: `Ok(())`, or the reason it could not use the resource.
pub type ConsumerResult = std::result::Result<(), BoxError>;

/// A one-shot callback that wants to observe the resource.
///
/// Implemented for any `Fn(&R) -> ConsumerResult` closure. A consumer is
/// invoked at most once per registration; registering the same consumer
/// again (or a clone of it) yields another independent invocation.
pub trait Consumer<R>: Send {
    /// Observe the resource.
    fn consume(&self, resource: &R) -> ConsumerResult;
}

impl<R, F> Consumer<R> for F
where
    F: Fn(&R) -> ConsumerResult + Send,
{
    fn consume(&self, resource: &R) -> ConsumerResult {
        self(resource)
    }
}

/// Strategy notified when a consumer invocation fails.
///
/// Receives the failure and the resource the consumer was invoked with.
/// Implemented for any `Fn(ConsumerFailure, R)` closure.
pub trait FailureHandler<R>: Send + Sync {
    fn on_failure(&self, failure: ConsumerFailure, resource: R);
}

impl<R, F> FailureHandler<R> for F
where
    F: Fn(ConsumerFailure, R) + Send + Sync,
{
    fn on_failure(&self, failure: ConsumerFailure, resource: R) {
        self(failure, resource)
    }
}
