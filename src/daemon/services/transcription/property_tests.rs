//! Property tests for record updates.

use super::*;
use crate::daemon::services::kv::KvStore;
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = TranscriptionStatus> {
    prop_oneof![
        Just(TranscriptionStatus::Pending),
        Just(TranscriptionStatus::Processing),
        Just(TranscriptionStatus::Completed),
        Just(TranscriptionStatus::Failed),
    ]
}

fn patch_strategy() -> impl Strategy<Value = TranscriptionPatch> {
    (
        proptest::option::of(status_strategy()),
        proptest::option::of(".{0,64}"),
        proptest::option::of(0.0f64..=1.0),
    )
        .prop_map(|(status, text, confidence)| TranscriptionPatch {
            status,
            text,
            confidence,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn update_preserves_immutable_fields(
        size in 1u64..=25 * 1024 * 1024,
        owner in "[a-z0-9]{1,12}",
        patch in patch_strategy(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let store = TranscriptionStore::new(KvStore::memory(), StoreConfig::default());
            let before = store
                .create(
                    &owner,
                    FileMeta {
                        original_filename: "clip.ogg".to_string(),
                        size_bytes: size,
                        mime_type: "audio/ogg".to_string(),
                        duration_seconds: Some(3.25),
                    },
                    ProducedTranscript { text: "original".to_string(), confidence: None },
                )
                .await
                .unwrap();

            let after = store.update(&before.id, &patch).await.unwrap();

            prop_assert_eq!(&after.id, &before.id);
            prop_assert_eq!(&after.owner_id, &before.owner_id);
            prop_assert_eq!(&after.original_filename, &before.original_filename);
            prop_assert_eq!(after.file_size_bytes, before.file_size_bytes);
            prop_assert_eq!(&after.mime_type, &before.mime_type);
            prop_assert_eq!(after.duration_seconds, before.duration_seconds);
            prop_assert_eq!(after.created_at, before.created_at);
            prop_assert_eq!(after.expires_at, before.expires_at);
            prop_assert_eq!(after.status, patch.status.unwrap_or(before.status));
            prop_assert_eq!(store.get(&before.id).await.unwrap(), after);
            Ok(())
        })?;
    }

    #[test]
    fn floats_survive_create_get_and_status_update(
        confidence in 0.0f64..=1.0,
        duration in 0.0f64..1e6,
        status in status_strategy(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let store = TranscriptionStore::new(KvStore::memory(), StoreConfig::default());
            let created = store
                .create(
                    "u1",
                    FileMeta {
                        original_filename: "clip.ogg".to_string(),
                        size_bytes: 1000,
                        mime_type: "audio/ogg".to_string(),
                        duration_seconds: Some(duration),
                    },
                    ProducedTranscript { text: "t".to_string(), confidence: Some(confidence) },
                )
                .await
                .unwrap();

            prop_assert_eq!(store.get(&created.id).await.unwrap(), created.clone());

            let patch = TranscriptionPatch { status: Some(status), ..Default::default() };
            store.update(&created.id, &patch).await.unwrap();
            let after = store.get(&created.id).await.unwrap();

            prop_assert_eq!(after.confidence.map(f64::to_bits), Some(confidence.to_bits()));
            prop_assert_eq!(after.duration_seconds.map(f64::to_bits), Some(duration.to_bits()));
            prop_assert_eq!(after.status, status);
            Ok(())
        })?;
    }
}
