//! Error types for the resource holder.

use std::any::Any;
use thiserror::Error;

/// Boxed error returned by a failing consumer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for fallible library operations.
#[derive(Debug, Error)]
pub enum HolderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Dispatcher is closed")]
    DispatcherClosed,
}

/// A consumer invocation that did not complete successfully.
///
/// This is what a [`FailureHandler`](crate::FailureHandler) receives, paired
/// with the resource the consumer was invoked with.
#[derive(Debug, Error)]
pub enum ConsumerFailure {
    /// The consumer returned an error.
    #[error("Consumer failed: {0}")]
    Failed(#[source] BoxError),

    /// The consumer panicked. Holds the panic message when it was a string.
    #[error("Consumer panicked: {0}")]
    Panicked(String),
}

impl ConsumerFailure {
    /// Build a failure from a panic payload caught at the dispatch boundary.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        ConsumerFailure::Panicked(panic_message(payload))
    }

    /// True if the consumer panicked rather than returning an error.
    pub fn is_panic(&self) -> bool {
        matches!(self, ConsumerFailure::Panicked(_))
    }
}

/// Text of a caught panic, when the payload is a string.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

/// Result type for holder operations.
pub type Result<T> = std::result::Result<T, HolderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload_messages() {
        let failure = ConsumerFailure::from_panic(&"static message");
        assert!(failure.is_panic());
        assert_eq!(failure.to_string(), "Consumer panicked: static message");

        let failure = ConsumerFailure::from_panic(&String::from("owned message"));
        assert_eq!(failure.to_string(), "Consumer panicked: owned message");

        let failure = ConsumerFailure::from_panic(&42u32);
        assert_eq!(
            failure.to_string(),
            "Consumer panicked: <non-string panic payload>"
        );
    }

    #[test]
    fn test_failed_keeps_source() {
        use std::error::Error as _;

        let failure = ConsumerFailure::Failed("bad resource".into());
        assert!(!failure.is_panic());
        assert_eq!(failure.to_string(), "Consumer failed: bad resource");
        assert_eq!(failure.source().unwrap().to_string(), "bad resource");
    }
}
