//! End-to-end reconciliation scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use monet_cache::{CacheConfig, MemoryStorage, ResultCache, StorageBackend};
use monet_capability::plugin;
use monet_core::{Capability, DetectOptions, DetectionResult, Error};
use monet_runtime::{CacheSettings, Monetization, StorageKind};
use serde_json::json;
use tempfile::TempDir;

fn names(matches: &[monet_core::CapabilityMatch]) -> Vec<&str> {
    matches.iter().map(|m| m.capability.as_str()).collect()
}

/// Registers `name` with a test that sleeps `delay_ms`, counts its
/// invocations and reports `supported`.
fn define_counting(
    monetization: &Monetization,
    name: &str,
    supported: bool,
    delay_ms: u64,
) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    monetization
        .capabilities()
        .use_plugin(
            plugin::from_fn(name, move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Ok(DetectionResult {
                        is_supported: supported,
                        details: None,
                    })
                }
            })
            .unwrap(),
        )
        .unwrap();
    calls
}

async fn memory_backed() -> Monetization {
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
    let cache = ResultCache::open(CacheConfig::default(), Some(backend))
        .await
        .unwrap();
    Monetization::with_cache(cache)
}

#[tokio::test]
async fn test_exact_allow_beats_wildcard_deny() {
    let monetization = memory_backed().await;
    {
        let session = monetization.capabilities().acquire().unwrap();
        for name in ["pay/cardA", "pay/cardB", "wallet/*"] {
            session
                .use_plugin(plugin::fixed(name, DetectionResult::supported()).unwrap())
                .unwrap();
        }
    }

    monetization.preferences().deny("pay/*").unwrap();
    monetization.preferences().allow("pay/cardA").unwrap();

    let matches = monetization
        .match_capabilities(DetectOptions::default())
        .await;
    assert_eq!(names(&matches), vec!["pay/cardA", "wallet/*"]);
}

#[tokio::test]
async fn test_match_order_is_registration_order() {
    let monetization = memory_backed().await;
    // The slowest detection is registered first
    define_counting(&monetization, "slow/one", true, 60);
    define_counting(&monetization, "mid/two", true, 30);
    define_counting(&monetization, "fast/three", true, 0);
    define_counting(&monetization, "fast/four", false, 0);

    let matches = monetization
        .match_capabilities(DetectOptions::default())
        .await;
    assert_eq!(names(&matches), vec!["slow/one", "mid/two", "fast/three"]);
}

#[tokio::test]
async fn test_bypass_cache_reinvokes_and_overwrites() {
    let monetization = memory_backed().await;
    let calls = define_counting(&monetization, "pay/card", true, 0);

    monetization
        .cache()
        .set("pay/card", &DetectionResult::unsupported())
        .await
        .unwrap();

    // The cached negative result is honoured
    assert!(monetization
        .match_capabilities(DetectOptions::default())
        .await
        .is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Bypassing runs the test and replaces the cached value
    let matches = monetization
        .match_capabilities(DetectOptions::bypass_cache())
        .await;
    assert_eq!(names(&matches), vec!["pay/card"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        monetization.cache().get("pay/card").await.unwrap(),
        Some(DetectionResult::supported())
    );

    // And the next ordinary pass is served from the cache
    monetization
        .match_capabilities(DetectOptions::default())
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_passes_share_detections() {
    let monetization = Arc::new(memory_backed().await);
    let calls = define_counting(&monetization, "pay/card", true, 40);

    let (first, second) = tokio::join!(
        monetization.match_capabilities(DetectOptions::bypass_cache()),
        monetization.match_capabilities(DetectOptions::bypass_cache()),
    );

    assert_eq!(names(&first), vec!["pay/card"]);
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_timed_out_detection_is_unsupported() {
    let monetization = memory_backed().await;
    let hanging = plugin::from_fn("wallet/*", || async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(DetectionResult::supported())
    })
    .unwrap();
    monetization
        .capabilities()
        .use_plugin(plugin::with_timeout(hanging, Duration::from_millis(20)))
        .unwrap();
    monetization
        .capabilities()
        .use_plugin(
            plugin::fixed(
                "pay/card",
                DetectionResult::supported().with_details(json!({"network": "visa"})),
            )
            .unwrap(),
        )
        .unwrap();

    let matches = monetization
        .match_capabilities(DetectOptions::default())
        .await;
    assert_eq!(names(&matches), vec!["pay/card"]);
    assert_eq!(matches[0].details, Some(json!({"network": "visa"})));
}

#[tokio::test]
async fn test_file_cache_survives_restart() {
    let dir = TempDir::new().unwrap();
    let settings = CacheSettings {
        backend: StorageKind::File,
        directory: Some(dir.path().to_path_buf()),
        ..CacheSettings::default()
    };

    let first = Monetization::from_settings(&settings).await.unwrap();
    let calls = define_counting(&first, "pay/card", true, 0);
    assert!(first
        .detect("pay/card", DetectOptions::default())
        .await
        .unwrap()
        .is_supported);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    drop(first);

    // A new runtime over the same directory answers from the cache
    let second = Monetization::from_settings(&settings).await.unwrap();
    let calls = define_counting(&second, "pay/card", false, 0);
    assert!(second
        .detect("pay/card", DetectOptions::default())
        .await
        .unwrap()
        .is_supported);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Clearing forces the test to run again
    second.clear_cache().await.unwrap();
    assert!(second.cache().keys().is_empty());
    assert!(!second
        .detect("pay/card", DetectOptions::default())
        .await
        .unwrap()
        .is_supported);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_registration_locked_during_session() {
    let monetization = Monetization::new();
    let session = monetization.capabilities().acquire().unwrap();
    session
        .use_plugin(plugin::fixed("pay/card", DetectionResult::supported()).unwrap())
        .unwrap();

    // Reads and detections proceed while the session is open
    assert_eq!(
        monetization.user_acceptable_capabilities(),
        vec![Capability::new("pay/card").unwrap()]
    );
    assert!(monetization
        .detect("pay/card", DetectOptions::default())
        .await
        .unwrap()
        .is_supported);

    assert!(monetization
        .capabilities()
        .use_plugin(plugin::fixed("pay/other", DetectionResult::supported()).unwrap())
        .is_err());

    session.release();
    monetization
        .capabilities()
        .use_plugin(plugin::fixed("pay/other", DetectionResult::supported()).unwrap())
        .unwrap();
    assert_eq!(monetization.capabilities().len(), 2);

    assert!(matches!(
        monetization.detect("", DetectOptions::default()).await,
        Err(Error::MissingArgument(_))
    ));
}
