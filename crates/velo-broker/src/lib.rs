#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Topic-based pub/sub message broker for the velo daemon.
//!
//! The [`Broker`] owns every subscription and fans published messages out
//! concurrently to all matching subscribers. Each delivery is bounded: a
//! subscriber whose queue stays full past the publish timeout surfaces as a
//! [`BrokerError::SlowConsumer`] to the publisher, rather than being
//! silently dropped.
//!
//! # Example
//!
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use velo_broker::{Broker, Message};
//!
//! # async fn example() -> velo_broker::BrokerResult<()> {
//! let broker = Broker::new();
//! let mut rx = broker.subscribe("terminal", 16, ["chat"]).await;
//!
//! let cancel = CancellationToken::new();
//! broker
//!     .publish(&cancel, Message::text("chat", "telegram", "hello"))
//!     .await?;
//!
//! let msg = rx.recv().await.unwrap();
//! assert_eq!(msg.topic, "chat");
//! # Ok(())
//! # }
//! ```

mod broker;
mod error;
mod message;

pub use broker::{Broker, DEFAULT_PUBLISH_TIMEOUT, Receiver};
pub use error::{BrokerError, BrokerResult};
pub use message::{
    Message, Payload, TOPIC_CHAT, TOPIC_NOTIFICATION, TOPIC_RESPONSE, TOPIC_WILDCARD,
};
