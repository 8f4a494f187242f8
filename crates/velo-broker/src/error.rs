//! Broker error types.

/// Errors from broker operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// The broker has been closed; no further publishes are accepted.
    #[error("broker is closed")]
    Closed,

    /// A subscriber's queue stayed full past the publish timeout.
    #[error("timeout publishing to {subscriber} (slow consumer)")]
    SlowConsumer {
        /// The subscriber whose queue did not accept the message in time.
        subscriber: String,
    },

    /// The caller's cancellation token fired before delivery completed.
    #[error("publish cancelled")]
    Cancelled,
}

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;
