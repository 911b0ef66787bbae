//! Property-Based Tests for the Cache-Aside Layer
//!
//! Runs random sequences of saves, reads and deletes against the
//! orchestrator and checks them against a plain map of the expected records.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use tokio::sync::broadcast::error::TryRecvError;

use crate::aside::test_support::{phone, CountingStore};
use crate::aside::CacheAsideOrchestrator;
use crate::bus::BroadcastBus;
use crate::cache::{CacheStore, MemoryCacheStore};
use crate::config::Config;
use crate::models::Phone;
use crate::store::{InMemoryRecordStore, RecordStore};

// == Test Configuration ==
const IMEIS: [&str; 4] = ["IMEI-A", "IMEI-B", "IMEI-C", "IMEI-D"];

// == Strategies ==
#[derive(Debug, Clone)]
enum Op {
    Save { imei: usize, name: String },
    Get { imei: usize },
    Delete { imei: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..IMEIS.len(), "[a-zA-Z]{1,12}").prop_map(|(imei, name)| Op::Save { imei, name }),
        (0..IMEIS.len()).prop_map(|imei| Op::Get { imei }),
        (0..IMEIS.len()).prop_map(|imei| Op::Delete { imei }),
    ]
}

struct Fixture {
    store: Arc<CountingStore>,
    cache: Arc<MemoryCacheStore>,
    bus: Arc<BroadcastBus>,
    orchestrator: CacheAsideOrchestrator,
}

fn fixture() -> Fixture {
    let config = Config::default();
    let store = Arc::new(CountingStore::new(InMemoryRecordStore::new()));
    let cache = Arc::new(MemoryCacheStore::new(true));
    let bus = Arc::new(BroadcastBus::new(config.invalidation_channel.clone()));
    let orchestrator =
        CacheAsideOrchestrator::new(store.clone(), cache.clone(), bus.clone(), &config);
    Fixture {
        store,
        cache,
        bus,
        orchestrator,
    }
}

fn cache_key(imei: &str) -> String {
    format!("{}{}", Config::default().cache_key_prefix, imei)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Every read returns what was last saved under the IMEI, and any snapshot
    // left in the cache decodes to the record the store currently holds.
    #[test]
    fn prop_reads_match_last_write(ops in prop::collection::vec(op_strategy(), 1..40)) {
        tokio_test::block_on(async {
            let f = fixture();
            let mut expected: HashMap<&str, Phone> = HashMap::new();

            for op in ops {
                match op {
                    Op::Save { imei, name } => {
                        let key = IMEIS[imei];
                        let mut record = phone(key, &name);
                        record.id = expected.get(key).and_then(|p| p.id.clone());
                        let saved = f.orchestrator.save(record).await.unwrap();
                        expected.insert(key, saved);
                    }
                    Op::Get { imei } => {
                        let key = IMEIS[imei];
                        let got = f.orchestrator.get_by_secondary_key(key).await.unwrap();
                        prop_assert_eq!(got.as_ref(), expected.get(key));
                    }
                    Op::Delete { imei } => {
                        let key = IMEIS[imei];
                        if let Some(record) = expected.remove(key) {
                            f.orchestrator.delete(record.id.as_deref().unwrap()).await.unwrap();
                        }
                    }
                }

                for key in IMEIS {
                    if let Some(entry) = f.cache.get(&cache_key(key)).await.unwrap() {
                        let stored = f.store.find_by_secondary_key(key).await.unwrap();
                        prop_assert_eq!(Some(entry.decode().unwrap()), stored);
                    }
                }
            }
            Ok(())
        })?;
    }

    // A read of an IMEI that was never saved never leaves anything in the cache.
    #[test]
    fn prop_negative_results_not_cached(imei in "[0-9]{15}", repeats in 1usize..5) {
        tokio_test::block_on(async {
            let f = fixture();
            for _ in 0..repeats {
                let got = f.orchestrator.get_by_secondary_key(&imei).await.unwrap();
                prop_assert!(got.is_none());
            }
            prop_assert!(f.cache.is_empty().await);
            prop_assert_eq!(f.store.key_lookups(), repeats);
            Ok(())
        })?;
    }

    // Each save of a record carrying an IMEI emits exactly one event naming it.
    #[test]
    fn prop_one_event_per_save(names in prop::collection::vec("[a-z]{1,8}", 1..10)) {
        tokio_test::block_on(async {
            let f = fixture();
            let mut events = f.bus.subscribe();
            let mut id = None;

            for name in &names {
                let mut record = phone("IMEI-E", name);
                record.id = id.clone();
                id = f.orchestrator.save(record).await.unwrap().id;

                let event = events.try_recv().unwrap();
                prop_assert_eq!(event.payload(), "IMEI-E");
                prop_assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
            }
            prop_assert_eq!(f.bus.published(), names.len() as u64);
            Ok(())
        })?;
    }

    // After a read populates the cache, further reads are served without the store.
    #[test]
    fn prop_repeat_reads_hit_cache(name in "[a-zA-Z]{1,12}", reads in 2usize..8) {
        tokio_test::block_on(async {
            let f = fixture();
            let saved = f.orchestrator.save(phone("IMEI-F", &name)).await.unwrap();

            for _ in 0..reads {
                let got = f.orchestrator.get_by_secondary_key("IMEI-F").await.unwrap();
                prop_assert_eq!(got.as_ref(), Some(&saved));
            }
            prop_assert_eq!(f.store.key_lookups(), 1);
            prop_assert_eq!(f.orchestrator.stats().hits, reads as u64 - 1);
            Ok(())
        })?;
    }
}
