//! # Integration Test Flows
//!
//! Messages travelling across crate boundaries:
//!
//! 1. **Publish-subscribe fan-out**: registration order and reply routing
//!    through a `ChannelRegistry`
//! 2. **Priority inbound → dispatcher → remote store**: ordering survives
//!    the hop from a buffered channel into a transfer subscriber
//! 3. **Shared pool under threads**: one `CachingSessionFactory` feeding a
//!    `RemoteFileTemplate` from several producers
//! 4. **Runtime pipeline**: directory to directory under an existence policy

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tempfile::TempDir;

    use sy_01_dispatcher::{DispatchError, DispatcherConfig, DispatcherConfigBuilder};
    use sy_02_channels::{
        ChannelConfig, ChannelRegistry, PriorityChannel, PublishSubscribeChannel, QueueChannel,
    };
    use sy_03_session_pool::{CachingSessionFactory, PoolConfig, PoolConfigBuilder};
    use sy_04_remote_transfer::{
        FileExistsMode, InMemorySessionFactory, InMemoryStore, LocalFileSessionFactory,
        RemoteDirectory, RemoteFileTemplate, TransferConfig, TransferConfigBuilder,
        TransferPayload,
    };
    use sy_runtime::{Pipeline, RuntimeConfig};
    use sy_types::{
        consumer, handler_fn, ChannelError, HandlerError, Message, MessageBuilder,
        MessageChannel, PollableChannel,
    };

    use crate::fixtures::{named_text, Recorder};

    fn in_memory_template(
        config: TransferConfig,
        max_size: usize,
    ) -> Arc<RemoteFileTemplate<InMemorySessionFactory>> {
        let factory = InMemorySessionFactory::new(InMemoryStore::new());
        let pool = CachingSessionFactory::new(
            factory,
            PoolConfigBuilder::new().max_size(max_size).build().unwrap(),
        )
        .unwrap();
        Arc::new(RemoteFileTemplate::new(pool, config).unwrap())
    }

    // =============================================================================
    // PUBLISH-SUBSCRIBE
    // =============================================================================

    #[test]
    fn test_six_subscribers_see_message_in_registration_order() {
        let channel = PublishSubscribeChannel::new("events", DispatcherConfig::default());
        let (recorders, log) = Recorder::<u32>::group(6);
        for recorder in recorders {
            channel.subscribe_handler(recorder);
        }

        assert!(channel.send(Message::new(7)).unwrap());

        let indices: Vec<usize> = log.lock().iter().map(|(index, _)| *index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert!(log.lock().iter().all(|(_, payload)| *payload == 7));
    }

    #[test]
    fn test_reply_routed_to_named_channel() {
        let registry = Arc::new(ChannelRegistry::<String>::new());
        let replies = Arc::new(QueueChannel::new(ChannelConfig::bounded("replies", 10)).unwrap());
        let as_channel: Arc<dyn MessageChannel<String>> = replies.clone();
        registry.register(as_channel);

        let requests = PublishSubscribeChannel::new("requests", DispatcherConfig::default())
            .with_resolver(registry.clone());
        requests.subscribe_handler(handler_fn(|message: &Message<String>| {
            Ok(Some(Message::new(message.payload().to_uppercase())))
        }));

        let request = MessageBuilder::with_payload("ping".to_string())
            .reply_channel("replies")
            .build();
        requests.send(request).unwrap();

        let reply = replies.try_receive().unwrap();
        assert_eq!(reply.payload(), "PING");
        assert_eq!(requests.dispatcher().stats().replies, 1);
    }

    #[test]
    fn test_reply_to_unknown_channel_surfaces_as_delivery_error() {
        let registry = Arc::new(ChannelRegistry::<String>::new());
        let requests = PublishSubscribeChannel::new("requests", DispatcherConfig::default())
            .with_resolver(registry);
        requests.subscribe_handler(handler_fn(|message: &Message<String>| {
            Ok(Some(message.clone()))
        }));

        let request = MessageBuilder::with_payload("ping".to_string())
            .reply_channel("nowhere")
            .build();
        let err = requests.send(request).unwrap_err();

        match err {
            ChannelError::Delivery { source, .. } => {
                assert!(matches!(
                    source.downcast_ref::<DispatchError>(),
                    Some(DispatchError::UnknownChannel { .. })
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reply_into_full_channel_does_not_block_publisher() {
        let registry = Arc::new(ChannelRegistry::<String>::new());
        let replies = Arc::new(QueueChannel::new(ChannelConfig::bounded("replies", 1)).unwrap());
        assert!(replies.try_send(Message::new("occupied".to_string())).unwrap());
        let as_channel: Arc<dyn MessageChannel<String>> = replies.clone();
        registry.register(as_channel);

        let requests = Arc::new(
            PublishSubscribeChannel::new(
                "requests",
                DispatcherConfigBuilder::new()
                    .reply_timeout(Duration::from_millis(100))
                    .build(),
            )
            .with_resolver(registry),
        );
        requests.subscribe_handler(handler_fn(|message: &Message<String>| {
            Ok(Some(message.clone()))
        }));

        let (tx, rx) = std::sync::mpsc::channel();
        let publisher = {
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                let request = MessageBuilder::with_payload("ping".to_string())
                    .reply_channel("replies")
                    .build();
                tx.send(requests.send(request)).unwrap();
            })
        };

        let result = rx
            .recv_timeout(Duration::from_secs(3))
            .expect("publisher blocked on a full reply channel");
        publisher.join().unwrap();

        match result.unwrap_err() {
            ChannelError::Delivery { source, .. } => {
                assert!(matches!(
                    source.downcast_ref::<DispatchError>(),
                    Some(DispatchError::ReplyRejected { channel }) if channel == "replies"
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(replies.queue_size(), 1);
        assert_eq!(replies.try_receive().unwrap().payload(), "occupied");
    }

    // =============================================================================
    // PRIORITY INBOUND → DISPATCHER → REMOTE STORE
    // =============================================================================

    #[test]
    fn test_priority_inbound_delivers_highest_first() {
        let template = in_memory_template(
            TransferConfigBuilder::new()
                .remote_directory(RemoteDirectory::fixed("/out"))
                .build()
                .unwrap(),
            1,
        );
        let inbound: PriorityChannel<TransferPayload> =
            PriorityChannel::new(ChannelConfig::bounded("inbound", 16)).unwrap();
        let outbound = PublishSubscribeChannel::new(
            "outbound",
            DispatcherConfigBuilder::new().apply_sequence(true).build(),
        );

        let transfer = Arc::clone(&template);
        outbound.subscribe_handler(handler_fn(move |message: &Message<TransferPayload>| {
            transfer
                .send(message)
                .map(|_| None)
                .map_err(|e| HandlerError::with_source("transfer failed", e))
        }));
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&delivered);
        outbound.subscribe_handler(consumer(move |message: &Message<TransferPayload>| {
            let name = message
                .headers()
                .get_as::<String>(sy_types::keys::FILE_NAME)
                .unwrap()
                .unwrap_or_default();
            let sequence = message.headers().sequence_number().unwrap();
            sink.lock().push((name, sequence));
        }));

        for (name, priority) in [("low", 1), ("high", 9), ("mid", 5), ("mid-2", 5)] {
            let message = MessageBuilder::with_payload(TransferPayload::from(name))
                .set_header(sy_types::keys::FILE_NAME, name)
                .priority(priority)
                .build();
            assert!(inbound.try_send(message).unwrap());
        }

        while let Some(message) = inbound.try_receive() {
            outbound.send(message).unwrap();
        }

        let delivered = delivered.lock().clone();
        let names: Vec<&str> = delivered.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "mid-2", "low"]);
        assert!(delivered.iter().all(|(_, sequence)| *sequence == Some(2)));

        let store = template.pool().factory().store();
        assert_eq!(store.paths().len(), 4);
        assert_eq!(store.file("/out/high").unwrap(), b"high");
        assert_eq!(template.stats().written, 4);
    }

    // =============================================================================
    // SHARED POOL UNDER THREADS
    // =============================================================================

    #[test]
    fn test_threads_share_local_pool() {
        let dir = TempDir::new().unwrap();
        let factory = LocalFileSessionFactory::new(dir.path()).unwrap();
        let pool = CachingSessionFactory::new(
            factory,
            PoolConfigBuilder::new()
                .max_size(2)
                .wait_timeout(Duration::from_secs(10))
                .build()
                .unwrap(),
        )
        .unwrap();
        let template = Arc::new(
            RemoteFileTemplate::new(
                pool,
                TransferConfigBuilder::new()
                    .remote_directory(RemoteDirectory::fixed("batch"))
                    .auto_create_directory(true)
                    .build()
                    .unwrap(),
            )
            .unwrap(),
        );

        let producers: Vec<_> = (0..4)
            .map(|producer| {
                let template = Arc::clone(&template);
                thread::spawn(move || {
                    for i in 0..5 {
                        let name = format!("p{producer}-{i}.txt");
                        template.send(&named_text(&name, &name)).unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(template.stats().written, 20);
        assert_eq!(template.list("batch").unwrap().len(), 20);
        assert_eq!(
            fs::read_to_string(dir.path().join("batch/p3-4.txt")).unwrap(),
            "p3-4.txt"
        );
        let pool = template.pool().stats();
        assert!(pool.created <= 2);
        assert_eq!(pool.outstanding, 0);
        assert!(pool.allocated <= 2);
    }

    #[test]
    fn test_reset_cache_forces_reconnect() {
        let template = in_memory_template(TransferConfig::default(), 2);
        template.send(&named_text("a", "1")).unwrap();

        template.pool().reset_cache();
        template.send(&named_text("b", "2")).unwrap();

        assert_eq!(template.pool().factory().sessions_created(), 2);
        assert_eq!(template.pool().stats().generation, 1);
    }

    #[test]
    fn test_refused_connection_surfaces_as_pool_error() {
        let factory = InMemorySessionFactory::new(InMemoryStore::new());
        factory.refuse_connections(true);
        let pool = CachingSessionFactory::new(factory, PoolConfig::default()).unwrap();
        let template = RemoteFileTemplate::new(pool, TransferConfig::default()).unwrap();

        let err = template.send(&named_text("a", "1")).unwrap_err();

        assert!(matches!(err, sy_04_remote_transfer::TransferError::Pool(_)));
        assert_eq!(template.pool().stats().allocated, 0);

        template.pool().factory().refuse_connections(false);
        template.send(&named_text("a", "1")).unwrap();
    }

    // =============================================================================
    // RUNTIME PIPELINE
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_runtime_ignore_mode_keeps_existing_files() {
        sy_telemetry::init_test_logging();
        let root = TempDir::new().unwrap();
        let source = root.path().join("in");
        let target = root.path().join("out");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&target).unwrap();
        fs::write(source.join("keep.txt"), b"new").unwrap();
        fs::write(source.join("fresh.txt"), b"new").unwrap();
        fs::write(target.join("keep.txt"), b"old").unwrap();

        let config = RuntimeConfig {
            source_dir: source,
            target_dir: target.clone(),
            exists_mode: FileExistsMode::Ignore,
            poll_interval: Duration::from_millis(10),
            ..RuntimeConfig::default()
        };
        let pipeline = Arc::new(Pipeline::new(config).unwrap());
        let summary = Arc::clone(&pipeline).run().await.unwrap();

        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(fs::read(target.join("keep.txt")).unwrap(), b"old");
        assert_eq!(fs::read(target.join("fresh.txt")).unwrap(), b"new");
    }
}
