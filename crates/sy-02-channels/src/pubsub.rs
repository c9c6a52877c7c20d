//! Publish-subscribe channel: a `MessageChannel` front for a
//! `BroadcastingDispatcher`.

use std::sync::Arc;
use std::time::Duration;

use sy_01_dispatcher::{BroadcastingDispatcher, DispatcherConfig};
use sy_types::{
    ChannelError, DestinationResolver, Message, MessageChannel, MessageHandler,
    SubscribableChannel, SubscriptionHandle,
};
use tracing::{debug, warn};

use crate::metrics::{ChannelMetrics, ChannelStats};

/// Delivers every sent message to all subscribers on the sending thread.
///
/// Sending never blocks on capacity, so the timeout is ignored.
pub struct PublishSubscribeChannel<T> {
    name: String,
    dispatcher: BroadcastingDispatcher<T>,
    metrics: ChannelMetrics,
}

impl<T: Send + Sync + 'static> PublishSubscribeChannel<T> {
    pub fn new(name: impl Into<String>, config: DispatcherConfig) -> Self {
        Self {
            name: name.into(),
            dispatcher: BroadcastingDispatcher::new(config),
            metrics: ChannelMetrics::new(),
        }
    }

    /// Route subscriber replies through `resolver`.
    pub fn with_resolver(mut self, resolver: Arc<dyn DestinationResolver<T>>) -> Self {
        self.dispatcher = self.dispatcher.with_resolver(resolver);
        self
    }

    /// Subscribe a handler by value.
    pub fn subscribe_handler(
        &self,
        handler: impl MessageHandler<T> + 'static,
    ) -> SubscriptionHandle {
        self.dispatcher.subscribe(handler)
    }

    pub fn subscriber_count(&self) -> usize {
        self.dispatcher.subscriber_count()
    }

    /// The underlying dispatcher.
    pub fn dispatcher(&self) -> &BroadcastingDispatcher<T> {
        &self.dispatcher
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats::capture(&self.name, None, 0, &self.metrics)
    }
}

impl<T: Send + Sync + 'static> MessageChannel<T> for PublishSubscribeChannel<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_timeout(
        &self,
        message: Message<T>,
        _timeout: Option<Duration>,
    ) -> Result<bool, ChannelError> {
        match self.dispatcher.dispatch(&message) {
            Ok(handled) => {
                self.metrics.record_sent();
                self.metrics.record_received();
                debug!(channel = %self.name, message_id = %message.id(), handled, "Message published");
                Ok(true)
            }
            Err(err) => {
                self.metrics.record_rejected();
                warn!(channel = %self.name, message_id = %message.id(), error = %err, "Publish failed");
                Err(ChannelError::Delivery {
                    channel: self.name.clone(),
                    source: Box::new(err),
                })
            }
        }
    }
}

impl<T: Send + Sync + 'static> SubscribableChannel<T> for PublishSubscribeChannel<T> {
    fn subscribe(&self, handler: Arc<dyn MessageHandler<T>>) -> SubscriptionHandle {
        self.dispatcher.subscribe_arc(handler)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.dispatcher.unsubscribe(handle)
    }
}
