//! Execution strategies for consumer invocations.
//!
//! The holder never calls a consumer directly. Every invocation is wrapped in a
//! [`Work`] item and handed to a [`Dispatcher`], which decides where and when
//! it runs:
//! - [`ImmediateDispatcher`] runs it inline on the calling thread
//! - [`WorkerDispatcher`] queues it for a pool of worker threads
//! - [`FnDispatcher`] hands it to a closure (an executor handle, a test queue)
//!
//! # Example
//!
//! ```ignore
//! let dispatcher = WorkerDispatcher::new(WorkerDispatcherConfig {
//!     workers: 4,
//!     ..Default::default()
//! })?;
//! let holder = ResourceHolder::new(dispatcher, LoggingFailureHandler);
//! ```

mod immediate;
mod worker;

use std::sync::Arc;

pub use immediate::ImmediateDispatcher;
pub use worker::{WorkerDispatcher, WorkerDispatcherConfig};

/// A zero-argument unit of work.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Runs units of work, synchronously or asynchronously.
pub trait Dispatcher: Send + Sync {
    /// Run `work`, now or later.
    fn dispatch(&self, work: Work);
}

impl<D: Dispatcher + ?Sized> Dispatcher for Arc<D> {
    fn dispatch(&self, work: Work) {
        (**self).dispatch(work)
    }
}

impl<D: Dispatcher + ?Sized> Dispatcher for Box<D> {
    fn dispatch(&self, work: Work) {
        (**self).dispatch(work)
    }
}

/// Adapts an `Fn(Work)` closure into a [`Dispatcher`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FnDispatcher<F>(pub F);

impl<F> Dispatcher for FnDispatcher<F>
where
    F: Fn(Work) + Send + Sync,
{
    fn dispatch(&self, work: Work) {
        (self.0)(work)
    }
}
