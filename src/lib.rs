//! # Resource Holder
//!
//! A single-value broadcaster: producers set the latest value of a resource,
//! consumers ask for it once and are notified when it exists.
//!
//! ## Core Concepts
//!
//! - **Resource**: The single value held and handed out by the holder
//! - **Consumer**: A one-shot callback that observes the resource once
//! - **Dispatcher**: Decides where and when a consumer invocation runs
//! - **Failure handler**: Receives consumer errors and panics, with the resource
//!
//! ## Example
//!
//! ```
//! use resource_holder::{ConsumerResult, ImmediateDispatcher, LoggingFailureHandler, ResourceHolder};
//!
//! let holder = ResourceHolder::new(ImmediateDispatcher, LoggingFailureHandler);
//!
//! // No resource yet: the consumer waits
//! holder.consume_resource(|config: &String| -> ConsumerResult {
//!     println!("got {config}");
//!     Ok(())
//! });
//! assert_eq!(holder.pending_count(), 1);
//!
//! // Setting the resource notifies it
//! holder.set_resource("ready".to_string());
//! assert_eq!(holder.pending_count(), 0);
//! ```

pub mod dispatch;
pub mod error;
pub mod failure;
pub mod holder;
pub mod types;

// Re-exports
pub use dispatch::{
    Dispatcher, FnDispatcher, ImmediateDispatcher, Work, WorkerDispatcher, WorkerDispatcherConfig,
};
pub use error::{BoxError, ConsumerFailure, HolderError, Result};
pub use failure::{IgnoreFailures, LoggingFailureHandler};
pub use holder::ResourceHolder;
pub use types::{Consumer, ConsumerResult, FailureHandler};
