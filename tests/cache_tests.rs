use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use ghcontrib::cache::ResultCache;

#[tokio::test]
async fn test_computes_once_then_hits() {
    let cache: ResultCache<String, u32> = ResultCache::new(4);
    let calls = AtomicU32::new(0);
    let calls = &calls;

    for _ in 0..3 {
        let value = cache
            .get_or_try_insert_with("k".to_string(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(7)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.size, 1);
}

#[tokio::test]
async fn test_errors_are_not_cached() {
    let cache: ResultCache<u32, u32> = ResultCache::new(4);

    let err = cache
        .get_or_try_insert_with(1, || async { Err::<u32, _>("boom") })
        .await
        .unwrap_err();
    assert_eq!(err, "boom");
    assert!(cache.is_empty());

    let value = cache
        .get_or_try_insert_with(1, || async { Ok::<_, &str>(9) })
        .await
        .unwrap();
    assert_eq!(value, 9);
}

#[tokio::test]
async fn test_clear_forces_recompute() {
    let cache: ResultCache<u32, u32> = ResultCache::new(4);
    let calls = AtomicU32::new(0);
    let calls = &calls;
    let compute = move || async move { Ok::<_, ()>(calls.fetch_add(1, Ordering::SeqCst)) };

    assert_eq!(cache.get_or_try_insert_with(1, compute).await, Ok(0));
    assert_eq!(cache.get_or_try_insert_with(1, compute).await, Ok(0));
    cache.clear();
    assert_eq!(cache.get_or_try_insert_with(1, compute).await, Ok(1));
    assert_eq!(cache.stats().hits, 0);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_computation() {
    let cache: Arc<ResultCache<&'static str, u32>> = Arc::new(ResultCache::new(4));
    let calls = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            cache
                .get_or_try_insert_with("same", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, ()>(42)
                })
                .await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok(42));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_distinct_keys_compute_independently() {
    let cache: ResultCache<u32, u32> = ResultCache::new(4);
    let a = cache
        .get_or_try_insert_with(1, || async { Ok::<_, ()>(10) })
        .await;
    let b = cache
        .get_or_try_insert_with(2, || async { Ok::<_, ()>(20) })
        .await;
    assert_eq!(a, Ok(10));
    assert_eq!(b, Ok(20));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_capacity_bound() {
    let cache: ResultCache<u32, u32> = ResultCache::new(32);
    for i in 0..40 {
        cache.insert(i, i);
    }
    assert_eq!(cache.len(), 32);
    assert_eq!(cache.get(&0), None);
    assert_eq!(cache.get(&39), Some(39));
}
