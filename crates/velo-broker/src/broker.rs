//! The pub/sub broker: subscription table and concurrent fan-out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendTimeoutError, TryRecvError};
use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{BrokerError, BrokerResult};
use crate::message::{Message, TOPIC_WILDCARD};

/// Default timeout for publishing to a slow consumer.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// A broker-held binding: subscriber id, bounded queue, topic filter.
///
/// `demand` is present only for rendezvous subscriptions (capacity 0): a
/// delivery must first take a permit, and permits are minted one per
/// [`Receiver::recv`] call.
struct Subscription {
    id: String,
    tx: mpsc::Sender<Message>,
    topics: Vec<String>,
    demand: Option<Arc<Semaphore>>,
}

impl Subscription {
    /// Whether this subscription's filter matches a topic.
    ///
    /// An empty filter matches everything; otherwise the filter must contain
    /// the literal topic or the wildcard token.
    fn wants_topic(&self, topic: &str) -> bool {
        self.topics.is_empty()
            || self
                .topics
                .iter()
                .any(|t| t == topic || t == TOPIC_WILDCARD)
    }
}

/// The receive end of a subscription.
///
/// For buffered subscriptions this is a thin wrapper over the underlying
/// queue. For rendezvous subscriptions (capacity 0) each [`recv`](Self::recv)
/// call signals demand to the broker; a publish completes only by handing its
/// message to a receiver that is waiting.
pub struct Receiver {
    rx: mpsc::Receiver<Message>,
    demand: Option<Arc<Semaphore>>,
}

impl Receiver {
    /// Receive the next message, or `None` once the subscription is closed.
    pub async fn recv(&mut self) -> Option<Message> {
        if let Some(demand) = &self.demand {
            demand.add_permits(1);
        }
        self.rx.recv().await
    }

    /// Receive without waiting. Never signals demand, so it cannot unblock a
    /// rendezvous publish.
    ///
    /// # Errors
    ///
    /// [`TryRecvError::Empty`] when no message is queued,
    /// [`TryRecvError::Disconnected`] once the subscription is closed.
    pub fn try_recv(&mut self) -> Result<Message, TryRecvError> {
        self.rx.try_recv()
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        // A publish waiting on demand sees the closed semaphore and skips
        // the delivery instead of timing out.
        if let Some(demand) = &self.demand {
            demand.close();
        }
    }
}

impl std::fmt::Debug for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver").finish_non_exhaustive()
    }
}

struct BrokerState {
    subscriptions: HashMap<String, Subscription>,
    closed: bool,
    publish_timeout: Duration,
}

/// Topic-based pub/sub hub.
///
/// The broker owns every [`Subscription`]; subscribers own only the
/// receive-end handle returned by [`subscribe`](Broker::subscribe). The
/// subscription table is guarded by a single reader/writer lock:
/// [`publish`](Broker::publish) holds the read half for the whole fan-out,
/// so concurrent publishes do not block each other while any
/// subscribe/unsubscribe/close waits for in-flight publishes to drain.
pub struct Broker {
    state: RwLock<BrokerState>,
}

impl Broker {
    /// Create a broker with the default publish timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BrokerState {
                subscriptions: HashMap::new(),
                closed: false,
                publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            }),
        }
    }

    /// Create or replace the subscription for `id`.
    ///
    /// Returns the receive end of a bounded queue. A capacity of 0 creates a
    /// rendezvous subscription: it has no buffer, and a publish completes
    /// only by handing its message to a receiver already waiting in
    /// [`Receiver::recv`] — with nobody waiting, the publish counts toward
    /// the publish timeout.
    ///
    /// Replacing an existing subscription closes the old queue immediately —
    /// messages resting on it are lost, not drained. Subscribing on a closed
    /// broker is a deliberate no-op: the returned handle is already closed,
    /// so late subscribers observe end-of-stream instead of crashing.
    pub async fn subscribe<I, S>(&self, id: &str, capacity: usize, topics: I) -> Receiver
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topics: Vec<String> = topics.into_iter().map(Into::into).collect();

        let mut state = self.state.write().await;

        if state.closed {
            warn!(subscriber = id, "Subscribe on closed broker; returning closed handle");
            let (tx, rx) = mpsc::channel(1);
            drop(tx);
            return Receiver { rx, demand: None };
        }

        // Dropping the old sender closes the old receiver.
        if state.subscriptions.remove(id).is_some() {
            debug!(subscriber = id, "Replacing existing subscription");
        }

        // A rendezvous subscription still needs one queue slot for the
        // handoff; the demand semaphore keeps publishes from using it early.
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let demand = (capacity == 0).then(|| Arc::new(Semaphore::new(0)));
        state.subscriptions.insert(
            id.to_string(),
            Subscription {
                id: id.to_string(),
                tx,
                topics: topics.clone(),
                demand: demand.clone(),
            },
        );
        debug!(subscriber = id, ?topics, capacity, "Subscribed");
        Receiver { rx, demand }
    }

    /// Publish a message to every matching subscription.
    ///
    /// Deliveries run concurrently, one per matched subscriber; each races
    /// queue-accept against the caller's cancellation token and the shared
    /// publish timeout. Zero matching subscriptions is success with zero
    /// deliveries. Any single timeout aborts the whole call with
    /// [`BrokerError::SlowConsumer`] naming the offender — all-or-nothing
    /// reporting, so producers hear loudly when a consumer cannot keep up.
    ///
    /// The call suspends until every delivery resolves; callers that must
    /// not block should publish from a dedicated background task. The broker
    /// never retries — retry policy belongs to the publisher.
    ///
    /// # Errors
    ///
    /// [`BrokerError::Closed`] after [`close`](Broker::close),
    /// [`BrokerError::SlowConsumer`] on a delivery timeout, and
    /// [`BrokerError::Cancelled`] when `cancel` fires first.
    pub async fn publish(&self, cancel: &CancellationToken, message: Message) -> BrokerResult<()> {
        let state = self.state.read().await;

        if state.closed {
            return Err(BrokerError::Closed);
        }

        let targets: Vec<&Subscription> = state
            .subscriptions
            .values()
            .filter(|sub| sub.wants_topic(&message.topic))
            .collect();

        if targets.is_empty() {
            trace!(topic = %message.topic, "No subscribers for topic");
            return Ok(());
        }

        // The timeout is read here, under the same read lock held for the
        // fan-out, so a concurrent set_publish_timeout cannot race it.
        let timeout = state.publish_timeout;

        let deliveries = targets
            .iter()
            .map(|sub| Self::deliver(sub, message.clone(), timeout, cancel));
        try_join_all(deliveries).await?;

        debug!(
            topic = %message.topic,
            source = %message.source,
            subscribers = targets.len(),
            "Published message"
        );
        Ok(())
    }

    /// Deliver to a single subscriber, racing queue-accept, cancellation,
    /// and the timeout with no priority order.
    ///
    /// A rendezvous delivery first waits for a demand permit; the handoff
    /// slot is guaranteed free once the permit is held.
    async fn deliver(
        sub: &Subscription,
        message: Message,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> BrokerResult<()> {
        if let Some(demand) = &sub.demand {
            return tokio::select! {
                res = tokio::time::timeout(timeout, demand.acquire()) => match res {
                    Ok(Ok(permit)) => {
                        permit.forget();
                        if sub.tx.send(message).await.is_err() {
                            debug!(subscriber = %sub.id, "Receiver dropped; delivery skipped");
                        }
                        Ok(())
                    }
                    // Closed semaphore: the receiver handle was dropped.
                    Ok(Err(_)) => {
                        debug!(subscriber = %sub.id, "Receiver dropped; delivery skipped");
                        Ok(())
                    }
                    Err(_) => Err(BrokerError::SlowConsumer {
                        subscriber: sub.id.clone(),
                    }),
                },
                () = cancel.cancelled() => Err(BrokerError::Cancelled),
            };
        }

        tokio::select! {
            res = sub.tx.send_timeout(message, timeout) => match res {
                Ok(()) => Ok(()),
                Err(SendTimeoutError::Timeout(_)) => Err(BrokerError::SlowConsumer {
                    subscriber: sub.id.clone(),
                }),
                Err(SendTimeoutError::Closed(_)) => {
                    // Receiver handle was dropped without unsubscribing; the
                    // stale binding is cleaned up on the next subscribe or
                    // unsubscribe for this id.
                    debug!(subscriber = %sub.id, "Receiver dropped; delivery skipped");
                    Ok(())
                },
            },
            () = cancel.cancelled() => Err(BrokerError::Cancelled),
        }
    }

    /// Remove the subscription for `id` and close its queue.
    ///
    /// Idempotent: unknown ids are a no-op.
    pub async fn unsubscribe(&self, id: &str) {
        let mut state = self.state.write().await;
        if state.subscriptions.remove(id).is_some() {
            debug!(subscriber = id, "Unsubscribed");
        }
    }

    /// Close the broker: every subscription queue is closed and all bindings
    /// are cleared. Idempotent.
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        if state.closed {
            return;
        }
        state.closed = true;
        let count = state.subscriptions.len();
        state.subscriptions.clear();
        debug!(subscriptions = count, "Broker closed");
    }

    /// The current number of subscriptions.
    pub async fn subscriber_count(&self) -> usize {
        self.state.read().await.subscriptions.len()
    }

    /// Set the shared per-delivery timeout used by all future publishes.
    pub async fn set_publish_timeout(&self, timeout: Duration) {
        self.state.write().await.publish_timeout = timeout;
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(topic: &str) -> Message {
        Message::text(topic, "test", "payload")
    }

    #[tokio::test]
    async fn empty_filter_matches_every_topic() {
        let broker = Broker::new();
        let mut rx = broker.subscribe("all", 4, Vec::<String>::new()).await;

        let cancel = CancellationToken::new();
        broker.publish(&cancel, msg("chat")).await.unwrap();
        broker.publish(&cancel, msg("notification")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().topic, "chat");
        assert_eq!(rx.recv().await.unwrap().topic, "notification");
    }

    #[tokio::test]
    async fn literal_filter_matches_only_listed_topics() {
        let broker = Broker::new();
        let mut rx = broker.subscribe("chatter", 4, ["chat"]).await;

        let cancel = CancellationToken::new();
        broker.publish(&cancel, msg("notification")).await.unwrap();
        broker.publish(&cancel, msg("chat")).await.unwrap();

        // Only the chat message lands on the queue.
        assert_eq!(rx.recv().await.unwrap().topic, "chat");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn wildcard_filter_matches_every_topic() {
        let broker = Broker::new();
        let mut rx = broker.subscribe("spy", 4, [TOPIC_WILDCARD]).await;

        let cancel = CancellationToken::new();
        broker.publish(&cancel, msg("anything")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().topic, "anything");
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_succeeds() {
        let broker = Broker::new();
        let cancel = CancellationToken::new();
        broker.publish(&cancel, msg("chat")).await.unwrap();

        // A non-matching subscriber still leaves the set empty.
        let _rx = broker.subscribe("other", 4, ["response"]).await;
        broker.publish(&cancel, msg("chat")).await.unwrap();
    }

    #[tokio::test]
    async fn resubscribe_closes_the_first_queue() {
        let broker = Broker::new();
        let mut first = broker.subscribe("s1", 4, ["chat"]).await;
        let mut second = broker.subscribe("s1", 4, ["chat"]).await;

        // The replaced queue reports closed.
        assert!(first.recv().await.is_none());

        let cancel = CancellationToken::new();
        broker.publish(&cancel, msg("chat")).await.unwrap();
        assert_eq!(second.recv().await.unwrap().topic, "chat");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_consumer_times_out_with_offender_id() {
        let broker = Broker::new();
        broker.set_publish_timeout(Duration::from_millis(50)).await;

        // No buffer and nobody waiting: a single publish already times out.
        let _rx = broker.subscribe("s1", 0, ["chat"]).await;
        let cancel = CancellationToken::new();
        let err = broker.publish(&cancel, msg("chat")).await.unwrap_err();
        assert_eq!(
            err,
            BrokerError::SlowConsumer {
                subscriber: "s1".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_receiver_completes_a_rendezvous_publish() {
        use std::sync::Arc;

        let broker = Arc::new(Broker::new());
        broker.set_publish_timeout(Duration::from_millis(50)).await;
        let mut rx = broker.subscribe("s1", 0, ["chat"]).await;

        let reader = tokio::spawn(async move { rx.recv().await });

        let cancel = CancellationToken::new();
        broker.publish(&cancel, msg("chat")).await.unwrap();
        assert_eq!(reader.await.unwrap().unwrap().topic, "chat");
    }

    #[tokio::test]
    async fn dropped_rendezvous_receiver_does_not_fail_publish() {
        let broker = Broker::new();
        let rx = broker.subscribe("gone", 0, ["chat"]).await;
        drop(rx);

        let cancel = CancellationToken::new();
        broker.publish(&cancel, msg("chat")).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn one_slow_consumer_fails_the_whole_publish() {
        let broker = Broker::new();
        broker.set_publish_timeout(Duration::from_millis(50)).await;

        let mut fast = broker.subscribe("fast", 8, ["chat"]).await;
        let _slow = broker.subscribe("slow", 1, ["chat"]).await;

        let cancel = CancellationToken::new();
        broker.publish(&cancel, msg("chat")).await.unwrap();

        // slow's queue is now full; the publish as a whole errors even
        // though fast would have accepted.
        let err = broker.publish(&cancel, msg("chat")).await.unwrap_err();
        assert!(matches!(err, BrokerError::SlowConsumer { subscriber } if subscriber == "slow"));

        assert_eq!(fast.recv().await.unwrap().topic, "chat");
    }

    #[tokio::test]
    async fn cancellation_aborts_delivery() {
        let broker = Broker::new();
        let _rx = broker.subscribe("s1", 1, ["chat"]).await;

        let cancel = CancellationToken::new();
        broker.publish(&cancel, msg("chat")).await.unwrap();

        // Queue full and the token already fired: cancellation wins.
        cancel.cancel();
        let err = broker.publish(&cancel, msg("chat")).await.unwrap_err();
        assert_eq!(err, BrokerError::Cancelled);
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_closes_queue() {
        let broker = Broker::new();
        let mut rx = broker.subscribe("s1", 4, ["chat"]).await;
        assert_eq!(broker.subscriber_count().await, 1);

        broker.unsubscribe("s1").await;
        broker.unsubscribe("s1").await;
        broker.unsubscribe("never-existed").await;

        assert_eq!(broker.subscriber_count().await, 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn close_is_idempotent_and_rejects_publishes() {
        let broker = Broker::new();
        let mut rx = broker.subscribe("s1", 4, ["chat"]).await;

        broker.close().await;
        broker.close().await;

        assert!(rx.recv().await.is_none());
        assert_eq!(broker.subscriber_count().await, 0);

        let cancel = CancellationToken::new();
        let err = broker.publish(&cancel, msg("chat")).await.unwrap_err();
        assert_eq!(err, BrokerError::Closed);
    }

    #[tokio::test]
    async fn subscribe_after_close_yields_closed_handle() {
        let broker = Broker::new();
        broker.close().await;

        let mut rx = broker.subscribe("late", 4, ["chat"]).await;
        assert!(rx.recv().await.is_none());
        assert_eq!(broker.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_fail_publish() {
        let broker = Broker::new();
        let rx = broker.subscribe("gone", 4, ["chat"]).await;
        drop(rx);

        let cancel = CancellationToken::new();
        broker.publish(&cancel, msg("chat")).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn draining_subscriber_unblocks_a_pending_publish() {
        use std::sync::Arc;

        let broker = Arc::new(Broker::new());
        broker.set_publish_timeout(Duration::from_secs(5)).await;
        let mut rx = broker.subscribe("s1", 1, ["chat"]).await;

        let cancel = CancellationToken::new();
        broker.publish(&cancel, msg("chat")).await.unwrap();

        // Second publish blocks on the full queue until the reader drains.
        let publisher = {
            let broker = Arc::clone(&broker);
            let cancel = cancel.clone();
            tokio::spawn(async move { broker.publish(&cancel, msg("chat")).await })
        };

        assert_eq!(rx.recv().await.unwrap().topic, "chat");
        publisher.await.unwrap().unwrap();
        assert_eq!(rx.recv().await.unwrap().topic, "chat");
    }
}
