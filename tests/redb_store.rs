//! End-to-end store behavior over the redb backend.
//!
//! Each test opens a fresh database in a temp dir, so they can run in
//! parallel.

use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use scribe::daemon::services::kv::KvStore;
use scribe::daemon::services::transcription::{
    Clock, FileMeta, ManualClock, ProducedTranscript, StoreConfig, Sweeper, TranscriptionPatch,
    TranscriptionStatus, TranscriptionStore,
};

fn meta(name: &str) -> FileMeta {
    FileMeta {
        original_filename: name.to_string(),
        size_bytes: 4096,
        mime_type: "audio/mpeg".to_string(),
        duration_seconds: Some(12.5),
    }
}

fn transcript(text: &str) -> ProducedTranscript {
    ProducedTranscript {
        text: text.to_string(),
        confidence: Some(0.9),
    }
}

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
}

fn open(path: &std::path::Path, clock: &ManualClock) -> TranscriptionStore {
    TranscriptionStore::with_clock(
        KvStore::file(path).unwrap(),
        StoreConfig::default(),
        Arc::new(clock.clone()),
    )
}

#[tokio::test]
async fn test_records_and_index_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transcriptions.redb");
    let clock = clock();

    let (first, second) = {
        let store = open(&path, &clock);
        let first = store.create("alice", meta("a.mp3"), transcript("one")).await.unwrap();
        clock.advance(TimeDelta::seconds(1));
        let second = store.create("alice", meta("b.mp3"), transcript("two")).await.unwrap();
        store
            .update(
                &first.id,
                &TranscriptionPatch {
                    status: Some(TranscriptionStatus::Failed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        (first, second)
    };

    let store = open(&path, &clock);
    let listed = store.list_by_owner("alice").await.unwrap();
    let ids: Vec<_> = listed.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, [second.id.as_str(), first.id.as_str()]);

    let reloaded = store.get(&first.id).await.unwrap();
    assert_eq!(reloaded.status, TranscriptionStatus::Failed);
    assert_eq!(reloaded.text, "one");
    assert_eq!(reloaded.created_at, first.created_at);
}

#[tokio::test]
async fn test_sweep_after_reopen_removes_expired_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transcriptions.redb");
    let clock = clock();

    let (old, fresh) = {
        let store = open(&path, &clock);
        let old = store.create("bob", meta("old.mp3"), transcript("old")).await.unwrap();
        clock.advance(TimeDelta::hours(12));
        let fresh = store.create("bob", meta("new.mp3"), transcript("new")).await.unwrap();
        (old, fresh)
    };

    clock.advance(TimeDelta::hours(13));
    let store = open(&path, &clock);
    let sweeper = Sweeper::new(store.clone());

    assert_eq!(sweeper.sweep(clock.now()).await.unwrap(), 1);
    assert_eq!(sweeper.sweep(clock.now()).await.unwrap(), 0);

    assert!(store.get(&old.id).await.unwrap_err().is_not_found());
    let listed = store.list_by_owner("bob").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, fresh.id);
}

#[tokio::test]
async fn test_delete_last_record_drops_owner_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transcriptions.redb");
    let clock = clock();
    let kv = KvStore::file(&path).unwrap();
    let store =
        TranscriptionStore::with_clock(kv.clone(), StoreConfig::default(), Arc::new(clock.clone()));

    let record = store.create("carol", meta("c.mp3"), transcript("c")).await.unwrap();
    assert!(kv.get("user_transcriptions:carol").await.unwrap().is_some());

    store.delete(&record.id).await.unwrap();
    assert!(kv.get("user_transcriptions:carol").await.unwrap().is_none());
    assert!(kv.scan_prefix("transcription:").await.unwrap().is_empty());
}
