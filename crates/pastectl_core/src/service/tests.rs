//! Lifecycle service tests.

use super::*;
use crate::db::RedbStore;
use crate::ids::ID_ALPHABET;
use crate::test_support::insert_expired;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn setup_service() -> (PasteService<RedbStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = RedbStore::open(temp_dir.path().join("db")).unwrap();
    (PasteService::new(store), temp_dir)
}

/// Store double that reports a collision for the first `collisions` creates.
struct CollidingStore {
    inner: RedbStore,
    collisions: usize,
    create_calls: AtomicUsize,
}

impl CollidingStore {
    fn new(collisions: usize) -> Self {
        Self {
            inner: RedbStore::in_memory().expect("in-memory store"),
            collisions,
            create_calls: AtomicUsize::new(0),
        }
    }
}

impl PasteStore for CollidingStore {
    fn create(&self, paste: &Paste) -> Result<(), StoreError> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.collisions {
            return Err(StoreError::UniqueViolation {
                id: paste.id.clone(),
            });
        }
        self.inner.create(paste)
    }

    fn get(&self, id: &str) -> Result<Option<Paste>, StoreError> {
        self.inner.get(id)
    }

    fn update(&self, id: &str, content: &str, language: &str) -> Result<Paste, StoreError> {
        self.inner.update(id, content, language)
    }

    fn increment_views(&self, id: &str, delta: u64) -> Result<Paste, StoreError> {
        self.inner.increment_views(id, delta)
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.inner.delete_expired(now)
    }
}

fn disk_failure() -> StoreError {
    redb::StorageError::Io(std::io::Error::other("disk unavailable")).into()
}

/// Store double whose operations always fail with an I/O error.
struct BrokenStore {
    create_calls: AtomicUsize,
}

impl PasteStore for BrokenStore {
    fn create(&self, _paste: &Paste) -> Result<(), StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Err(disk_failure())
    }

    fn get(&self, _id: &str) -> Result<Option<Paste>, StoreError> {
        Err(disk_failure())
    }

    fn update(&self, _id: &str, _content: &str, _language: &str) -> Result<Paste, StoreError> {
        Err(disk_failure())
    }

    fn increment_views(&self, _id: &str, _delta: u64) -> Result<Paste, StoreError> {
        Err(disk_failure())
    }

    fn delete_expired(&self, _now: DateTime<Utc>) -> Result<usize, StoreError> {
        Err(disk_failure())
    }
}

#[test]
fn create_assigns_short_alphanumeric_id_and_expiry() {
    let (service, _temp) = setup_service();
    for (token, lifetime) in [
        ("1h", Some(Duration::hours(1))),
        ("24h", Some(Duration::hours(24))),
        ("7d", Some(Duration::days(7))),
        ("never", None),
        ("", None),
    ] {
        let before = Utc::now();
        let paste = service
            .create("fn main() {}", "rust", Some(token))
            .expect("create");

        assert_eq!(paste.id.len(), PASTE_ID_LENGTH);
        assert!(paste.id.bytes().all(|b| ID_ALPHABET.contains(&b)));
        assert_eq!(paste.views, 0);
        match lifetime {
            Some(lifetime) => {
                let expire_at = paste.expire_at.expect("expiring paste");
                let drift = (expire_at - (before + lifetime)).num_milliseconds().abs();
                assert!(drift < 1_000, "token {} drifted {}ms", token, drift);
            }
            None => assert!(paste.expire_at.is_none(), "token {:?}", token),
        }
    }
}

#[test]
fn create_rejects_empty_content_or_language() {
    let (service, _temp) = setup_service();
    for (content, language, token) in [
        ("", "go", Some("1h")),
        ("", "", None),
        ("body", "", Some("never")),
        ("body", "", Some("bogus")),
    ] {
        let err = service
            .create(content, language, token)
            .expect_err("empty field must fail");
        assert!(
            matches!(err, AppError::InvalidArgument(_)),
            "({:?}, {:?}) gave {:?}",
            content,
            language,
            err
        );
    }
}

#[test]
fn create_rejects_unparsable_expiry() {
    let (service, _temp) = setup_service();
    let err = service
        .create("body", "text", Some("3 fortnights"))
        .expect_err("bad token");
    assert!(matches!(err, AppError::InvalidExpiryFormat(_)));
}

#[test]
fn create_then_get_returns_submitted_fields() {
    let (service, _temp) = setup_service();
    let created = service
        .create("Hello from a service test!", "go", Some("1h"))
        .expect("create");

    let fetched = service.get(&created.id).expect("get");
    assert_eq!(fetched, created);
    assert_eq!(fetched.content, "Hello from a service test!");
    assert_eq!(fetched.language, "go");
    assert_eq!(fetched.views, 0);
    assert_eq!(service.get_content(&created.id).expect("content"), created.content);
}

#[test]
fn get_unknown_id_is_not_found() {
    let (service, _temp) = setup_service();
    assert!(matches!(service.get("zzzzz"), Err(AppError::NotFound)));
    assert!(matches!(service.get_content("zzzzz"), Err(AppError::NotFound)));
    assert!(matches!(service.get("../etc"), Err(AppError::NotFound)));
}

#[test]
fn expired_paste_is_gone_on_every_read_path_until_swept() {
    let (service, _temp) = setup_service();
    let expired = insert_expired(service.store(), "stale", Duration::minutes(1));

    assert!(matches!(service.get(&expired.id), Err(AppError::Expired)));
    assert!(matches!(
        service.get_content(&expired.id),
        Err(AppError::Expired)
    ));
    assert!(
        service.store().get(&expired.id).expect("raw get").is_some(),
        "row must remain until the sweeper runs"
    );

    assert_eq!(service.delete_expired().expect("sweep"), 1);
    assert!(matches!(service.get(&expired.id), Err(AppError::NotFound)));
}

#[test]
fn create_with_lifetime_rejects_non_positive_lifetimes() {
    let (service, _temp) = setup_service();
    for lifetime in [Duration::zero(), Duration::minutes(-1)] {
        assert!(
            matches!(
                service.create_with_lifetime("body", "text", Some(lifetime)),
                Err(AppError::InvalidArgument(_))
            ),
            "lifetime {:?} should be rejected",
            lifetime
        );
    }

    let paste = service
        .create_with_lifetime("body", "text", Some(Duration::seconds(30)))
        .expect("positive lifetime");
    let expire_at = paste.expire_at.expect("expiry");
    assert!(expire_at > paste.created_at);
    assert!(service.get(&paste.id).is_ok());
}

#[test]
fn delete_expired_keeps_live_siblings_and_is_idempotent() {
    let (service, _temp) = setup_service();
    let stale_a = insert_expired(service.store(), "a", Duration::seconds(30));
    let stale_b = insert_expired(service.store(), "b", Duration::days(1));
    let live = service.create("c", "text", Some("1h")).expect("live");
    let forever = service.create("d", "text", None).expect("forever");

    assert_eq!(service.delete_expired().expect("first sweep"), 2);
    assert_eq!(service.delete_expired().expect("second sweep"), 0);

    assert!(matches!(service.get(&stale_a.id), Err(AppError::NotFound)));
    assert!(matches!(service.get(&stale_b.id), Err(AppError::NotFound)));
    assert_eq!(service.get(&live.id).expect("live").content, "c");
    assert_eq!(service.get(&forever.id).expect("forever").content, "d");
}

#[test]
fn update_replaces_content_and_defaults_language_to_text() {
    let (service, _temp) = setup_service();
    let created = service.create("v1", "python", Some("24h")).expect("create");

    let updated = service
        .update(&created.id, "v2", Some("rust"))
        .expect("update");
    assert_eq!(updated.content, "v2");
    assert_eq!(updated.language, "rust");
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.expire_at, created.expire_at);

    for language in [None, Some(""), Some("   ")] {
        let defaulted = service
            .update(&created.id, "v3", language)
            .expect("update without language");
        assert_eq!(defaulted.language, DEFAULT_LANGUAGE, "language: {:?}", language);
    }
    assert_eq!(service.get(&created.id).expect("get").language, "text");
}

#[test]
fn update_rejects_empty_content_and_unknown_ids() {
    let (service, _temp) = setup_service();
    let created = service.create("v1", "go", None).expect("create");

    assert!(matches!(
        service.update(&created.id, "", Some("go")),
        Err(AppError::InvalidArgument(_))
    ));
    assert!(matches!(
        service.update("nope1", "body", None),
        Err(AppError::NotFound)
    ));
}

#[test]
fn update_on_expired_paste_succeeds_but_stays_invisible() {
    let (service, _temp) = setup_service();
    let expired = insert_expired(service.store(), "old", Duration::minutes(5));

    let updated = service
        .update(&expired.id, "new", Some("go"))
        .expect("storage-level update");
    assert_eq!(updated.content, "new");
    assert!(matches!(service.get(&expired.id), Err(AppError::Expired)));
}

#[test]
fn increment_views_accumulates_and_reports_missing_ids() {
    let (service, _temp) = setup_service();
    let created = service.create("count me", "text", None).expect("create");

    service.increment_views(&created.id, 1).expect("first view");
    let viewed = service.increment_views(&created.id, 2).expect("second view");
    assert_eq!(viewed.views, 3);
    assert!(matches!(
        service.increment_views("ghost", 1),
        Err(AppError::NotFound)
    ));
}

#[test]
fn concurrent_increments_from_many_threads_are_exact() {
    let (service, _temp) = setup_service();
    let service = Arc::new(service);
    let created = service.create("popular", "text", None).expect("create");

    const VIEWERS: usize = 24;
    let barrier = Arc::new(Barrier::new(VIEWERS));
    let handles: Vec<_> = (0..VIEWERS)
        .map(|_| {
            let service = service.clone();
            let barrier = barrier.clone();
            let id = created.id.clone();
            thread::spawn(move || {
                barrier.wait();
                service.increment_views(&id, 1).expect("increment");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("viewer join");
    }

    assert_eq!(service.get(&created.id).expect("get").views, VIEWERS as u64);
}

#[test]
fn create_retries_after_collisions() {
    let store = Arc::new(CollidingStore::new(MAX_ID_ATTEMPTS - 1));
    let service = PasteService::new(store.clone());

    let paste = service.create("body", "text", None).expect("last attempt wins");
    assert_eq!(store.create_calls.load(Ordering::SeqCst), MAX_ID_ATTEMPTS);
    assert!(service.get(&paste.id).is_ok());
}

#[test]
fn create_gives_up_after_exhausting_attempts() {
    let store = Arc::new(CollidingStore::new(usize::MAX));
    let service = PasteService::new(store.clone());

    let err = service.create("body", "text", None).expect_err("exhausted");
    assert!(matches!(
        err,
        AppError::IdGenerationExhausted { attempts } if attempts == MAX_ID_ATTEMPTS
    ));
    assert_eq!(store.create_calls.load(Ordering::SeqCst), MAX_ID_ATTEMPTS);
}

#[test]
fn non_collision_store_errors_abort_without_retry() {
    let store = Arc::new(BrokenStore {
        create_calls: AtomicUsize::new(0),
    });
    let service = PasteService::new(store.clone());

    let err = service.create("body", "text", None).expect_err("store failure");
    assert!(matches!(err, AppError::Store(StoreError::Database(_))));
    assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);

    assert!(matches!(service.get("abcde"), Err(AppError::Store(_))));
    assert!(matches!(service.delete_expired(), Err(AppError::Store(_))));
}
