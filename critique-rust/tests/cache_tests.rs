use proofit_critique::{
    cache::{CacheError, CacheStore, Fingerprint, LazyCacheStore, MemoryCacheStore, ResultCache},
    request::normalize,
    Category, CritiqueRequest, Goal, ImageInput, Mode,
};
use std::{
    convert::Infallible,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

fn fingerprint(request: CritiqueRequest, category: Category, mode: Mode) -> Fingerprint {
    let normalized = normalize(request).expect("valid request");
    Fingerprint::compute(&normalized.input, category, mode)
}

#[test]
fn fingerprint_is_deterministic_and_content_addressed() {
    let request = || {
        CritiqueRequest::text("  <div class=\"p-[7px]\">Hi</div> ")
            .with_image(ImageInput::new("image/png", vec![9, 9, 9]))
    };
    let first = fingerprint(request(), Category::MixedInput, Mode::Critique);
    let second = fingerprint(request(), Category::MixedInput, Mode::Critique);
    assert_eq!(first, second);

    let key = first.key();
    let digest = key.strip_prefix("workflow:critique:").expect("key prefix");
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));

    let other_goal = fingerprint(request().with_goal(Goal::Premium), Category::MixedInput, Mode::Critique);
    assert_ne!(first, other_goal);

    let other_category = fingerprint(request(), Category::HtmlOrCode, Mode::Critique);
    assert_ne!(first, other_category);

    let other_image = fingerprint(
        CritiqueRequest::text("<div class=\"p-[7px]\">Hi</div>")
            .with_image(ImageInput::new("image/png", vec![9, 9, 8])),
        Category::MixedInput,
        Mode::Critique,
    );
    assert_ne!(first, other_image);
}

#[test]
fn fingerprint_does_not_confuse_field_boundaries() {
    let mut with_audience = CritiqueRequest::text("ab");
    with_audience.audience = Some("c".to_string());
    let mut shifted = CritiqueRequest::text("a");
    shifted.audience = Some("bc".to_string());

    assert_ne!(
        fingerprint(with_audience, Category::Unknown, Mode::Critique),
        fingerprint(shifted, Category::Unknown, Mode::Critique)
    );
}

#[test]
fn chat_fingerprint_uses_chat_namespace() {
    let key = fingerprint(CritiqueRequest::text("hi"), Category::Unknown, Mode::Chat).key();
    assert!(key.starts_with("workflow:chat:"));
}

#[tokio::test]
async fn caches_successes_only() {
    let store = Arc::new(MemoryCacheStore::new());
    let cache = ResultCache::new(store.clone(), Duration::from_secs(60));
    let key = fingerprint(CritiqueRequest::text("x"), Category::Unknown, Mode::Critique);

    let failed = cache
        .get_or_compute(&key, || async { Err::<String, _>("boom") })
        .await;
    assert_eq!(failed, Err("boom"));
    assert!(store.is_empty());

    let computed = cache
        .get_or_compute(&key, || async { Ok::<_, Infallible>("fresh".to_string()) })
        .await
        .unwrap();
    assert_eq!((computed.value.as_str(), computed.hit), ("fresh", false));

    let hit = cache
        .get_or_compute(&key, || async { Ok::<_, Infallible>("stale".to_string()) })
        .await
        .unwrap();
    assert_eq!((hit.value.as_str(), hit.hit), ("fresh", true));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn chat_mode_never_touches_the_store() {
    let store = Arc::new(MemoryCacheStore::new());
    let cache = ResultCache::new(store.clone(), Duration::from_secs(60));
    let key = fingerprint(CritiqueRequest::text("x"), Category::Unknown, Mode::Chat);

    for _ in 0..2 {
        let result = cache
            .get_or_compute(&key, || async { Ok::<_, Infallible>(1u32) })
            .await
            .unwrap();
        assert!(!result.hit);
    }
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn memory_store_expires_entries() {
    let store = MemoryCacheStore::new();
    store
        .set_ex("k", "v".to_string(), Duration::from_secs(10))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(9)).await;
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(store.get("k").await.unwrap(), None);
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn memory_store_prunes_expired_entries_on_write() {
    let store = MemoryCacheStore::new();
    store
        .set_ex("old", "v1".to_string(), Duration::from_secs(10))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(11)).await;
    assert_eq!(store.len(), 1);

    store
        .set_ex("new", "v2".to_string(), Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("new").await.unwrap().as_deref(), Some("v2"));
}

#[tokio::test]
async fn lazy_store_connects_once() {
    let connects = Arc::new(AtomicUsize::new(0));
    let counter = connects.clone();
    let store = LazyCacheStore::new(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<Arc<dyn CacheStore>, CacheError>(Arc::new(MemoryCacheStore::new()))
        }
    });
    assert!(!store.is_connected());

    store
        .set_ex("k", "v".to_string(), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

    assert!(store.is_connected());
    assert_eq!(connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lazy_store_retries_after_failed_connect() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let store = LazyCacheStore::new(move || {
        let attempt = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt == 0 {
                Err(CacheError::Unavailable("connection refused".to_string()))
            } else {
                Ok::<Arc<dyn CacheStore>, CacheError>(Arc::new(MemoryCacheStore::new()))
            }
        }
    });

    assert!(matches!(
        store.get("k").await,
        Err(CacheError::Unavailable(_))
    ));
    assert!(!store.is_connected());

    assert_eq!(store.get("k").await.unwrap(), None);
    assert!(store.is_connected());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn result_cache_survives_a_failing_backend() {
    let store = Arc::new(LazyCacheStore::new(|| async {
        Err::<Arc<dyn CacheStore>, _>(CacheError::Unavailable("down".to_string()))
    }));
    let cache = ResultCache::new(store, Duration::from_secs(60));
    let key = fingerprint(CritiqueRequest::text("x"), Category::Unknown, Mode::Critique);

    let result = cache
        .get_or_compute(&key, || async { Ok::<_, Infallible>("value".to_string()) })
        .await
        .unwrap();
    assert_eq!(result.value, "value");
    assert!(!result.hit);
}
