//! # Pool Contention
//!
//! Blocking acquire, exhaustion timing, stale-session eviction and slot
//! accounting of `CachingSessionFactory` under real threads.

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    use proptest::prelude::*;

    use sy_03_session_pool::{
        CachingSessionFactory, EntryState, PoolConfigBuilder, PoolError, PooledSession, Session,
    };
    use sy_04_remote_transfer::{InMemorySession, InMemorySessionFactory, InMemoryStore};

    fn pool(max_size: usize, wait: Option<Duration>) -> CachingSessionFactory<InMemorySessionFactory> {
        let builder = PoolConfigBuilder::new().max_size(max_size);
        let builder = match wait {
            Some(timeout) => builder.wait_timeout(timeout),
            None => builder.wait_forever(),
        };
        CachingSessionFactory::new(
            InMemorySessionFactory::new(InMemoryStore::new()),
            builder.build().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_third_acquire_blocks_until_release() {
        let pool = pool(2, Some(Duration::from_secs(10)));
        let first = pool.acquire().unwrap();
        let _second = pool.acquire().unwrap();

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || {
                let started = Instant::now();
                let result = pool.acquire().map(|session| session.session_id());
                tx.send((result, started.elapsed())).unwrap();
            })
        };

        // Still blocked while both slots are held.
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        let released_id = first.session_id();
        assert_eq!(first.release(), EntryState::Idle);

        let (result, waited) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result.unwrap(), released_id);
        assert!(waited >= Duration::from_millis(150));
        waiter.join().unwrap();
        assert_eq!(pool.factory().sessions_created(), 2);
    }

    #[test]
    fn test_exhaustion_after_configured_wait() {
        let pool = pool(1, Some(Duration::from_millis(3000)));
        let held = pool.acquire().unwrap();

        let started = Instant::now();
        let err = pool.acquire().unwrap_err();
        let elapsed = started.elapsed();

        match err {
            PoolError::Exhausted { max_size, waited } => {
                assert_eq!(max_size, 1);
                assert!(waited >= Duration::from_millis(2900));
            }
            other => panic!("expected exhaustion, got {other}"),
        }
        assert!(elapsed >= Duration::from_millis(2900));
        assert!(elapsed < Duration::from_millis(6000));

        // The abandoned acquire left no phantom slot behind.
        let stats = pool.stats();
        assert_eq!(stats.outstanding, 1);
        assert_eq!(stats.exhausted, 1);
        drop(held);
        assert_eq!(pool.stats().allocated, 1);
        assert!(pool.acquire_timeout(Some(Duration::ZERO)).is_ok());
    }

    #[test]
    fn test_zero_wait_fails_immediately() {
        let pool = pool(1, Some(Duration::ZERO));
        let _held = pool.acquire().unwrap();

        let started = Instant::now();
        assert!(matches!(pool.acquire(), Err(PoolError::Exhausted { .. })));
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_stale_idle_session_is_never_handed_out() {
        let pool = pool(2, Some(Duration::from_secs(1)));
        let stale_id = {
            let session = pool.acquire().unwrap();
            session.session_id()
        };

        pool.factory().disconnect_all();

        let mut fresh = pool.acquire().unwrap();
        assert_ne!(fresh.session_id(), stale_id);
        assert!(fresh.is_open());
        assert!(fresh.exists("/anything").is_ok());
        assert_eq!(pool.stats().stale_discarded, 1);
        assert_eq!(pool.factory().sessions_created(), 2);
    }

    #[test]
    fn test_close_wakes_waiters() {
        let pool = pool(1, None);
        let _held = pool.acquire().unwrap();

        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || pool.acquire().map(|session| session.session_id()))
        };
        thread::sleep(Duration::from_millis(100));
        pool.close();

        assert!(matches!(waiter.join().unwrap(), Err(PoolError::Closed)));
    }

    #[test]
    fn test_shrink_discards_surplus_on_release() {
        let pool = pool(2, Some(Duration::from_secs(1)));
        let first = pool.acquire().unwrap();
        let second = pool.acquire().unwrap();

        pool.set_max_size(1).unwrap();
        let states = [first.release(), second.release()];

        assert!(states.contains(&EntryState::Discarded));
        assert!(states.contains(&EntryState::Idle));
        let stats = pool.stats();
        assert_eq!(stats.max_size, 1);
        assert_eq!(stats.allocated, 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Acquire,
        Release(usize),
        Discard(usize),
        DisconnectAll,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Acquire),
            2 => any::<usize>().prop_map(Op::Release),
            1 => any::<usize>().prop_map(Op::Discard),
            1 => Just(Op::DisconnectAll),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn prop_slot_accounting_holds(max_size in 1usize..4, ops in prop::collection::vec(op(), 1..40)) {
            let pool = pool(max_size, Some(Duration::ZERO));
            let mut handles: Vec<PooledSession<InMemorySession>> = Vec::new();

            for op in ops {
                match op {
                    Op::Acquire => {
                        let full = handles.len() == max_size;
                        match pool.acquire() {
                            Ok(session) => {
                                prop_assert!(!full);
                                prop_assert!(session.is_open());
                                handles.push(session);
                            }
                            Err(err) => {
                                prop_assert!(full);
                                prop_assert!(matches!(err, PoolError::Exhausted { .. }), "unexpected error: {err}");
                            }
                        }
                    }
                    Op::Release(i) if !handles.is_empty() => {
                        let len = handles.len();
                        handles.remove(i % len).release();
                    }
                    Op::Discard(i) if !handles.is_empty() => {
                        let len = handles.len();
                        let mut session = handles.remove(i % len);
                        session.discard();
                        prop_assert_eq!(session.release(), EntryState::Discarded);
                    }
                    Op::DisconnectAll => pool.factory().disconnect_all(),
                    _ => {}
                }

                let stats = pool.stats();
                prop_assert_eq!(stats.outstanding, handles.len());
                prop_assert_eq!(stats.idle + stats.outstanding, stats.allocated);
                prop_assert!(stats.allocated <= max_size);
            }
        }
    }
}
