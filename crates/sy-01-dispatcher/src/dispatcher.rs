//! # Broadcasting Dispatcher
//!
//! Delivers one message to every registered subscriber.
//!
//! ```text
//!                    dispatch(msg)
//!                         │
//!              snapshot subscribers (read lock)
//!                         │
//!        ┌────────────────┼────────────────┐
//!        ▼                ▼                ▼
//!   subscriber #1    subscriber #2    subscriber #3     (registration order)
//!        │                │
//!        │ reply?         │ reply?
//!        ▼                ▼
//!   resolve `reply-channel` → send
//! ```
//!
//! The registry lock is held only while copying the subscriber list, never
//! while a handler runs, so handlers may subscribe or unsubscribe freely.

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use sy_types::{
    DestinationResolver, Message, MessageBuilder, MessageHandler, SubscriptionHandle,
};
use tracing::{debug, warn};

use crate::config::{DispatchMode, DispatcherConfig, FailurePolicy};
use crate::error::DispatchError;
use crate::metrics::{DispatcherMetrics, DispatcherStats};
use crate::registry::{Subscriber, SubscriberRegistry};

/// Fans a message out to all subscribers.
pub struct BroadcastingDispatcher<T> {
    config: DispatcherConfig,
    registry: RwLock<SubscriberRegistry<T>>,
    resolver: Option<Arc<dyn DestinationResolver<T>>>,
    metrics: DispatcherMetrics,
}

impl<T: Send + Sync + 'static> BroadcastingDispatcher<T> {
    /// Create a dispatcher with no reply routing.
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            registry: RwLock::new(SubscriberRegistry::new()),
            resolver: None,
            metrics: DispatcherMetrics::new(),
        }
    }

    /// Route handler replies through `resolver`.
    pub fn with_resolver(mut self, resolver: Arc<dyn DestinationResolver<T>>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// The dispatcher configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Register a handler after all existing ones.
    pub fn subscribe(&self, handler: impl MessageHandler<T> + 'static) -> SubscriptionHandle {
        self.subscribe_arc(Arc::new(handler))
    }

    /// Register a shared handler after all existing ones.
    pub fn subscribe_arc(&self, handler: Arc<dyn MessageHandler<T>>) -> SubscriptionHandle {
        let handle = self.registry.write().insert(handler);
        debug!(subscriber = %handle, "Subscriber registered");
        handle
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let removed = self.registry.write().remove(handle);
        if removed {
            debug!(subscriber = %handle, "Subscriber removed");
        }
        removed
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Raw counters.
    pub fn metrics(&self) -> &DispatcherMetrics {
        &self.metrics
    }

    /// Snapshot of counters and subscriber count.
    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats::capture(self.subscriber_count(), &self.metrics)
    }

    /// Deliver `message` to every subscriber.
    ///
    /// # Returns
    ///
    /// The number of subscribers that handled the message.
    ///
    /// # Errors
    ///
    /// - `NotEnoughSubscribers` when fewer than `min_subscribers` are registered
    /// - the first failure under `FailurePolicy::Propagate`
    /// - `Aggregate` of all failures under `FailurePolicy::CollectAndContinue`
    pub fn dispatch(&self, message: &Message<T>) -> Result<usize, DispatchError> {
        let subscribers = self.registry.read().snapshot();

        if subscribers.len() < self.config.min_subscribers {
            warn!(
                message_id = %message.id(),
                required = self.config.min_subscribers,
                actual = subscribers.len(),
                "Not enough subscribers for dispatch"
            );
            return Err(DispatchError::NotEnoughSubscribers {
                required: self.config.min_subscribers,
                actual: subscribers.len(),
            });
        }

        if subscribers.is_empty() {
            debug!(message_id = %message.id(), "No subscribers, nothing dispatched");
            return Ok(0);
        }

        self.metrics.record_dispatch();
        match self.config.mode {
            DispatchMode::Synchronous => self.dispatch_in_order(message, &subscribers),
            DispatchMode::Concurrent => self.dispatch_concurrently(message, &subscribers),
        }
    }

    fn dispatch_in_order(
        &self,
        message: &Message<T>,
        subscribers: &[Subscriber<T>],
    ) -> Result<usize, DispatchError> {
        let total = subscribers.len();
        let mut failures = Vec::new();

        for (position, (handle, handler)) in subscribers.iter().enumerate() {
            if let Err(err) = self.deliver(message, position, total, *handle, handler.as_ref()) {
                match self.config.failure_policy {
                    FailurePolicy::Propagate => return Err(err),
                    FailurePolicy::CollectAndContinue => failures.push(err),
                }
            }
        }

        Self::conclude(total, failures)
    }

    fn dispatch_concurrently(
        &self,
        message: &Message<T>,
        subscribers: &[Subscriber<T>],
    ) -> Result<usize, DispatchError> {
        let total = subscribers.len();
        let results: Vec<Result<(), DispatchError>> = subscribers
            .par_iter()
            .enumerate()
            .map(|(position, (handle, handler))| {
                self.deliver(message, position, total, *handle, handler.as_ref())
            })
            .collect();

        // Collected in registration order, so "first" is well defined.
        let failures: Vec<DispatchError> = results.into_iter().filter_map(Result::err).collect();
        match self.config.failure_policy {
            FailurePolicy::Propagate => failures.into_iter().next().map_or(Ok(total), Err),
            FailurePolicy::CollectAndContinue => Self::conclude(total, failures),
        }
    }

    fn conclude(total: usize, failures: Vec<DispatchError>) -> Result<usize, DispatchError> {
        if failures.is_empty() {
            Ok(total)
        } else {
            Err(DispatchError::Aggregate(failures))
        }
    }

    fn deliver(
        &self,
        message: &Message<T>,
        position: usize,
        total: usize,
        handle: SubscriptionHandle,
        handler: &dyn MessageHandler<T>,
    ) -> Result<(), DispatchError> {
        let delivery = self.prepare(message, position, total);

        let outcome = match handler.handle(&delivery) {
            Ok(None) => Ok(()),
            Ok(Some(reply)) => self.route_reply(&delivery, handle, reply),
            Err(source) => Err(DispatchError::Subscriber {
                subscriber: handle,
                source,
            }),
        };

        match &outcome {
            Ok(()) => self.metrics.record_delivery(),
            Err(err) => {
                self.metrics.record_failure();
                warn!(
                    subscriber = %handle,
                    message_id = %message.id(),
                    error = %err,
                    "Subscriber failed to handle message"
                );
            }
        }
        outcome
    }

    fn prepare<'a>(
        &self,
        message: &'a Message<T>,
        position: usize,
        total: usize,
    ) -> Cow<'a, Message<T>> {
        if !self.config.apply_sequence {
            return Cow::Borrowed(message);
        }
        let number = i64::try_from(position + 1).unwrap_or(i64::MAX);
        let size = i64::try_from(total).unwrap_or(i64::MAX);
        Cow::Owned(
            MessageBuilder::from_message(message)
                .sequence(number, size)
                .correlation_id(message.id())
                .build(),
        )
    }

    fn route_reply(
        &self,
        request: &Message<T>,
        subscriber: SubscriptionHandle,
        reply: Message<T>,
    ) -> Result<(), DispatchError> {
        let Some(name) = request.headers().reply_channel()? else {
            return Err(DispatchError::NoReplyChannel { subscriber });
        };

        let channel = self
            .resolver
            .as_ref()
            .and_then(|resolver| resolver.resolve(name))
            .ok_or_else(|| DispatchError::UnknownChannel {
                name: name.to_string(),
            })?;

        match channel.send_timeout(reply, self.config.reply_timeout) {
            Ok(true) => {
                self.metrics.record_reply();
                debug!(subscriber = %subscriber, channel = name, "Reply routed");
                Ok(())
            }
            Ok(false) => Err(DispatchError::ReplyRejected {
                channel: name.to_string(),
            }),
            Err(source) => Err(DispatchError::ReplyDelivery {
                channel: name.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatcherConfigBuilder;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;
    use std::time::Duration;
    use sy_types::{consumer, handler_fn, ChannelError, HandlerError, MessageChannel};

    /// Minimal channel collecting whatever is sent to it.
    struct CollectingChannel {
        name: String,
        messages: Mutex<Vec<Message<u32>>>,
    }

    impl CollectingChannel {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                messages: Mutex::new(Vec::new()),
            })
        }
    }

    impl MessageChannel<u32> for CollectingChannel {
        fn name(&self) -> &str {
            &self.name
        }

        fn send_timeout(
            &self,
            message: Message<u32>,
            _timeout: Option<Duration>,
        ) -> Result<bool, ChannelError> {
            self.messages.lock().push(message);
            Ok(true)
        }
    }

    /// Channel with no free capacity: waits out the send timeout, then refuses.
    struct FullChannel {
        waits: Mutex<Vec<Option<Duration>>>,
    }

    impl MessageChannel<u32> for FullChannel {
        fn name(&self) -> &str {
            "replies"
        }

        fn send_timeout(
            &self,
            _message: Message<u32>,
            timeout: Option<Duration>,
        ) -> Result<bool, ChannelError> {
            self.waits.lock().push(timeout);
            match timeout {
                Some(wait) => {
                    std::thread::sleep(wait);
                    Ok(false)
                }
                None => panic!("send into a full channel without a timeout never returns"),
            }
        }
    }

    struct MapResolver(HashMap<String, Arc<dyn MessageChannel<u32>>>);

    impl DestinationResolver<u32> for MapResolver {
        fn resolve(&self, name: &str) -> Option<Arc<dyn MessageChannel<u32>>> {
            self.0.get(name).cloned()
        }
    }

    fn recorder(log: &Arc<Mutex<Vec<usize>>>, id: usize) -> impl MessageHandler<u32> {
        let log = Arc::clone(log);
        consumer(move |_: &Message<u32>| log.lock().push(id))
    }

    fn failing(reason: &'static str) -> impl MessageHandler<u32> {
        handler_fn(move |_: &Message<u32>| Err(HandlerError::new(reason)))
    }

    #[test]
    fn test_six_subscribers_record_in_registration_order() {
        let dispatcher = BroadcastingDispatcher::new(DispatcherConfig::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        for id in 0..6 {
            dispatcher.subscribe(recorder(&log, id));
        }

        let handled = dispatcher.dispatch(&Message::new(1)).unwrap();

        assert_eq!(handled, 6);
        assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_no_subscribers_is_a_noop() {
        let dispatcher = BroadcastingDispatcher::<u32>::new(DispatcherConfig::default());
        assert_eq!(dispatcher.dispatch(&Message::new(1)).unwrap(), 0);
        assert_eq!(dispatcher.stats().dispatches, 0);
    }

    #[test]
    fn test_min_subscribers_enforced() {
        let config = DispatcherConfigBuilder::new().min_subscribers(2).build();
        let dispatcher = BroadcastingDispatcher::new(config);
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(recorder(&log, 0));

        let err = dispatcher.dispatch(&Message::new(1)).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::NotEnoughSubscribers {
                required: 2,
                actual: 1
            }
        ));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_propagate_skips_later_subscribers() {
        let dispatcher = BroadcastingDispatcher::new(DispatcherConfig::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(recorder(&log, 0));
        let bad = dispatcher.subscribe(failing("boom"));
        dispatcher.subscribe(recorder(&log, 2));

        let err = dispatcher.dispatch(&Message::new(1)).unwrap_err();

        match err {
            DispatchError::Subscriber { subscriber, source } => {
                assert_eq!(subscriber, bad);
                assert_eq!(source.message(), "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*log.lock(), vec![0]);
    }

    #[test]
    fn test_collect_and_continue_runs_everyone() {
        let config = DispatcherConfig::default()
            .with_failure_policy(FailurePolicy::CollectAndContinue);
        let dispatcher = BroadcastingDispatcher::new(config);
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(failing("first"));
        dispatcher.subscribe(recorder(&log, 1));
        dispatcher.subscribe(failing("second"));
        dispatcher.subscribe(recorder(&log, 3));

        let err = dispatcher.dispatch(&Message::new(1)).unwrap_err();

        assert_eq!(err.failure_count(), 2);
        assert_eq!(*log.lock(), vec![1, 3]);
        let stats = dispatcher.stats();
        assert_eq!(stats.deliveries, 2);
        assert_eq!(stats.failures, 2);
    }

    #[test]
    fn test_apply_sequence_stamps_each_copy() {
        let config = DispatcherConfigBuilder::new().apply_sequence(true).build();
        let dispatcher = BroadcastingDispatcher::new(config);
        let seen = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..3 {
            let seen = Arc::clone(&seen);
            dispatcher.subscribe(consumer(move |m: &Message<u32>| {
                let h = m.headers();
                seen.lock().push((
                    h.sequence_number().unwrap().unwrap(),
                    h.sequence_size().unwrap().unwrap(),
                    h.correlation_id().cloned(),
                ));
            }));
        }

        let original = Message::new(9);
        dispatcher.dispatch(&original).unwrap();

        let seen = seen.lock();
        let numbers: Vec<i64> = seen.iter().map(|(n, _, _)| *n).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(seen.iter().all(|(_, size, _)| *size == 3));
        assert!(seen
            .iter()
            .all(|(_, _, c)| *c == Some(sy_types::HeaderValue::Uuid(original.id()))));
    }

    #[test]
    fn test_reply_is_routed_and_siblings_still_receive() {
        let replies = CollectingChannel::new("replies");
        let mut map: HashMap<String, Arc<dyn MessageChannel<u32>>> = HashMap::new();
        map.insert("replies".into(), replies.clone());
        let dispatcher = BroadcastingDispatcher::new(DispatcherConfig::default())
            .with_resolver(Arc::new(MapResolver(map)));

        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(handler_fn(|m: &Message<u32>| {
            Ok(Some(Message::new(m.payload() * 10)))
        }));
        dispatcher.subscribe(recorder(&log, 1));

        let request = MessageBuilder::with_payload(4).reply_channel("replies").build();
        assert_eq!(dispatcher.dispatch(&request).unwrap(), 2);

        assert_eq!(*log.lock(), vec![1]);
        let replies = replies.messages.lock();
        assert_eq!(replies.len(), 1);
        assert_eq!(*replies[0].payload(), 40);
        assert_eq!(dispatcher.stats().replies, 1);
    }

    #[test]
    fn test_reply_without_reply_channel_fails_that_subscriber_only() {
        let config = DispatcherConfig::default()
            .with_failure_policy(FailurePolicy::CollectAndContinue);
        let dispatcher = BroadcastingDispatcher::new(config);
        let log = Arc::new(Mutex::new(Vec::new()));
        let replier =
            dispatcher.subscribe(handler_fn(|m: &Message<u32>| Ok(Some(m.clone()))));
        dispatcher.subscribe(recorder(&log, 1));

        let err = dispatcher.dispatch(&Message::new(1)).unwrap_err();

        match err {
            DispatchError::Aggregate(errors) => {
                assert!(matches!(
                    errors.as_slice(),
                    [DispatchError::NoReplyChannel { subscriber }] if *subscriber == replier
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*log.lock(), vec![1]);
    }

    #[test]
    fn test_reply_into_full_channel_is_rejected_after_timeout() {
        let full = Arc::new(FullChannel {
            waits: Mutex::new(Vec::new()),
        });
        let mut map: HashMap<String, Arc<dyn MessageChannel<u32>>> = HashMap::new();
        map.insert("replies".into(), full.clone());
        let config = DispatcherConfigBuilder::new()
            .failure_policy(FailurePolicy::CollectAndContinue)
            .reply_timeout(Duration::from_millis(20))
            .build();
        let dispatcher =
            BroadcastingDispatcher::new(config).with_resolver(Arc::new(MapResolver(map)));
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(handler_fn(|m: &Message<u32>| Ok(Some(m.clone()))));
        dispatcher.subscribe(recorder(&log, 1));

        let request = MessageBuilder::with_payload(1).reply_channel("replies").build();
        let started = std::time::Instant::now();
        let err = dispatcher.dispatch(&request).unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(1));
        match err {
            DispatchError::Aggregate(errors) => assert!(matches!(
                errors.as_slice(),
                [DispatchError::ReplyRejected { channel }] if channel == "replies"
            )),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*full.waits.lock(), vec![Some(Duration::from_millis(20))]);
        assert_eq!(*log.lock(), vec![1]);
        assert_eq!(dispatcher.stats().replies, 0);
    }

    #[test]
    fn test_unknown_reply_channel() {
        let dispatcher = BroadcastingDispatcher::new(DispatcherConfig::default())
            .with_resolver(Arc::new(MapResolver(HashMap::new())));
        dispatcher.subscribe(handler_fn(|m: &Message<u32>| Ok(Some(m.clone()))));

        let request = MessageBuilder::with_payload(1).reply_channel("nowhere").build();
        let err = dispatcher.dispatch(&request).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownChannel { name } if name == "nowhere"));
    }

    #[test]
    fn test_unsubscribe_during_dispatch_affects_next_dispatch_only() {
        let dispatcher = Arc::new(BroadcastingDispatcher::new(DispatcherConfig::default()));
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim: Arc<OnceLock<SubscriptionHandle>> = Arc::new(OnceLock::new());

        {
            let inner = Arc::clone(&dispatcher);
            let victim = Arc::clone(&victim);
            let log = Arc::clone(&log);
            dispatcher.subscribe(consumer(move |_: &Message<u32>| {
                log.lock().push(0);
                if let Some(handle) = victim.get() {
                    inner.unsubscribe(*handle);
                }
            }));
        }
        let handle = dispatcher.subscribe(recorder(&log, 1));
        victim.set(handle).unwrap();

        dispatcher.dispatch(&Message::new(1)).unwrap();
        assert_eq!(*log.lock(), vec![0, 1]);

        dispatcher.dispatch(&Message::new(2)).unwrap();
        assert_eq!(*log.lock(), vec![0, 1, 0]);
        assert_eq!(dispatcher.subscriber_count(), 1);
    }

    #[test]
    fn test_concurrent_mode_reaches_every_subscriber() {
        let config = DispatcherConfig::default().with_mode(DispatchMode::Concurrent);
        let dispatcher = BroadcastingDispatcher::new(config);
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..16 {
            let count = Arc::clone(&count);
            dispatcher.subscribe(consumer(move |_: &Message<u32>| {
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(dispatcher.dispatch(&Message::new(1)).unwrap(), 16);
        assert_eq!(count.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn test_concurrent_propagate_returns_first_failure_in_registration_order() {
        let config = DispatcherConfig::default().with_mode(DispatchMode::Concurrent);
        let dispatcher = BroadcastingDispatcher::new(config);
        let first = dispatcher.subscribe(failing("a"));
        dispatcher.subscribe(failing("b"));

        let err = dispatcher.dispatch(&Message::new(1)).unwrap_err();
        assert!(matches!(err, DispatchError::Subscriber { subscriber, .. } if subscriber == first));
    }
}
