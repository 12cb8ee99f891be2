//! The resource holder: latest-value delivery to one-shot consumers.

use crate::dispatch::{Dispatcher, ImmediateDispatcher};
use crate::error::ConsumerFailure;
use crate::failure::LoggingFailureHandler;
use crate::types::{Consumer, FailureHandler};
use parking_lot::Mutex;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, trace};

/// Mutable state, guarded by a single lock.
struct HolderState<R> {
    /// Latest resource, if any.
    current: Option<R>,
    /// Consumers registered while `current` was absent, in registration order.
    pending: Vec<Box<dyn Consumer<R>>>,
    /// Set by `destroy`; every later operation is ignored.
    destroyed: bool,
}

/// Holds at most one resource and hands it to consumers once it exists.
///
/// - [`consume_resource`](Self::consume_resource) with a resource present
///   dispatches the consumer immediately with that resource.
/// - Without one, the consumer waits for the next
///   [`set_resource`](Self::set_resource), which dispatches every waiting
///   consumer, in registration order, with the value it was given.
///
/// Every consumer invocation goes through the [`Dispatcher`]. A consumer that
/// returns an error or panics is reported to the [`FailureHandler`] together
/// with the resource; the failure never reaches the caller and the holder
/// keeps working.
///
/// The lock is never held while work is dispatched, so consumers may call
/// back into the holder.
pub struct ResourceHolder<R> {
    state: Mutex<HolderState<R>>,
    dispatcher: Box<dyn Dispatcher>,
    failure_handler: Arc<dyn FailureHandler<R>>,
}

impl<R> ResourceHolder<R>
where
    R: Clone + Send + 'static,
{
    /// Create an empty holder.
    pub fn new<D, H>(dispatcher: D, failure_handler: H) -> Self
    where
        D: Dispatcher + 'static,
        H: FailureHandler<R> + 'static,
    {
        Self {
            state: Mutex::new(HolderState {
                current: None,
                pending: Vec::new(),
                destroyed: false,
            }),
            dispatcher: Box::new(dispatcher),
            failure_handler: Arc::new(failure_handler),
        }
    }

    /// Replace the resource and dispatch every pending consumer with it.
    pub fn set_resource(&self, value: R) {
        let drained = {
            let mut state = self.state.lock();
            if state.destroyed {
                debug!("Ignoring set_resource on destroyed holder");
                return;
            }
            state.current = Some(value.clone());
            std::mem::take(&mut state.pending)
        };

        if drained.is_empty() {
            trace!("Resource set, no pending consumers");
            return;
        }

        debug!(consumers = drained.len(), "Resource set, draining pending consumers");
        for consumer in drained {
            self.dispatch(consumer, value.clone());
        }
    }

    /// Deliver the resource to `consumer` once.
    ///
    /// Dispatches right away if a resource is held, otherwise queues the
    /// consumer for the next [`set_resource`](Self::set_resource).
    pub fn consume_resource<C>(&self, consumer: C)
    where
        C: Consumer<R> + 'static,
    {
        let value = {
            let mut state = self.state.lock();
            if state.destroyed {
                debug!("Ignoring consume_resource on destroyed holder");
                return;
            }
            match state.current.clone() {
                Some(value) => value,
                None => {
                    state.pending.push(Box::new(consumer));
                    trace!(pending = state.pending.len(), "No resource yet, consumer queued");
                    return;
                }
            }
        };

        trace!("Resource present, dispatching consumer");
        self.dispatch(Box::new(consumer), value);
    }

    /// Forget the current resource.
    ///
    /// Consumers registered afterwards wait for the next
    /// [`set_resource`](Self::set_resource). Already-pending consumers are
    /// kept (there can only be any while no resource is held).
    pub fn clear_resource(&self) {
        let previous = {
            let mut state = self.state.lock();
            if state.destroyed {
                debug!("Ignoring clear_resource on destroyed holder");
                return;
            }
            state.current.take()
        };

        if previous.is_some() {
            debug!("Resource cleared");
        }
    }

    /// Drop the resource and every pending consumer, and ignore all later
    /// operations. Pending consumers are not invoked. Idempotent.
    pub fn destroy(&self) {
        let (previous, pending) = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            (state.current.take(), std::mem::take(&mut state.pending))
        };

        debug!(
            had_resource = previous.is_some(),
            discarded_consumers = pending.len(),
            "Holder destroyed"
        );
        // Dropped here, outside the lock.
        drop(previous);
        drop(pending);
    }

    /// Whether a resource is currently held.
    pub fn has_resource(&self) -> bool {
        self.state.lock().current.is_some()
    }

    /// Number of consumers waiting for a resource.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }

    fn dispatch(&self, consumer: Box<dyn Consumer<R>>, value: R) {
        let failure_handler = Arc::clone(&self.failure_handler);
        self.dispatcher.dispatch(Box::new(move || {
            invoke_guarded(consumer.as_ref(), value, failure_handler.as_ref())
        }));
    }
}

/// Run one consumer, routing an error or panic to the failure handler.
fn invoke_guarded<R>(consumer: &dyn Consumer<R>, value: R, failure_handler: &dyn FailureHandler<R>) {
    let failure = match panic::catch_unwind(AssertUnwindSafe(|| consumer.consume(&value))) {
        Ok(Ok(())) => return,
        Ok(Err(e)) => ConsumerFailure::Failed(e),
        Err(payload) => ConsumerFailure::from_panic(payload.as_ref()),
    };
    failure_handler.on_failure(failure, value);
}

impl<R> Default for ResourceHolder<R>
where
    R: Clone + Debug + Send + 'static,
{
    /// Inline dispatch, failures logged.
    fn default() -> Self {
        Self::new(ImmediateDispatcher, LoggingFailureHandler)
    }
}

impl<R> Debug for ResourceHolder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ResourceHolder")
            .field("has_resource", &state.current.is_some())
            .field("pending", &state.pending.len())
            .field("destroyed", &state.destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::IgnoreFailures;
    use crate::types::ConsumerResult;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Consumer<String> + Clone) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let consumer = move |r: &String| -> ConsumerResult {
            s.lock().push(r.clone());
            Ok(())
        };
        (seen, consumer)
    }

    #[test]
    fn test_state_transitions() {
        let holder: ResourceHolder<String> = ResourceHolder::new(ImmediateDispatcher, IgnoreFailures);
        let (seen, consumer) = recorder();

        assert!(!holder.has_resource());
        holder.consume_resource(consumer.clone());
        holder.consume_resource(consumer.clone());
        assert_eq!(holder.pending_count(), 2);
        assert!(seen.lock().is_empty());

        holder.set_resource("TEST".to_string());
        assert!(holder.has_resource());
        assert_eq!(holder.pending_count(), 0);
        assert_eq!(*seen.lock(), vec!["TEST", "TEST"]);

        holder.clear_resource();
        assert!(!holder.has_resource());
        holder.consume_resource(consumer);
        assert_eq!(holder.pending_count(), 1);
    }

    #[test]
    fn test_destroy_discards_pending_without_invoking() {
        let holder: ResourceHolder<String> = ResourceHolder::new(ImmediateDispatcher, IgnoreFailures);
        let (seen, consumer) = recorder();

        holder.consume_resource(consumer.clone());
        holder.destroy();
        assert!(holder.is_destroyed());
        assert_eq!(holder.pending_count(), 0);

        holder.set_resource("TEST".to_string());
        holder.consume_resource(consumer);
        assert!(!holder.has_resource());
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_invoke_guarded_reports_panic_with_value() {
        let failures = Mutex::new(Vec::new());
        let handler = |failure: ConsumerFailure, resource: String| {
            failures.lock().push((failure.is_panic(), resource));
        };
        let consumer = |_: &String| -> ConsumerResult { panic!("consumer blew up") };

        invoke_guarded(&consumer, "TEST".to_string(), &handler);

        assert_eq!(*failures.lock(), vec![(true, "TEST".to_string())]);
    }

    #[test]
    fn test_debug_output() {
        let holder: ResourceHolder<u32> = ResourceHolder::default();
        holder.set_resource(7);
        let debug = format!("{:?}", holder);
        assert!(debug.contains("has_resource: true"));
        assert!(debug.contains("pending: 0"));
    }
}
