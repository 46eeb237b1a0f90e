//! The ingestion loop
//!
//! Pulls decoded messages from the session, keeps the dial completions,
//! correlates and persists them, and narrates the outcome. The loop runs
//! until the store reports itself unavailable; everything else is survived
//! in place.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::directory::ContactDirectory;
use crate::error::Result;
use crate::extract::extract_dial_completion;
use crate::session::SessionManager;
use crate::store::{CallRecordStore, StoreError};
use crate::types::{CallRecord, ContactMatch, DialCompletionEvent};

pub struct IngestionPipeline {
    config: BridgeConfig,
    directory: Arc<dyn ContactDirectory>,
    store: Arc<dyn CallRecordStore>,
}

impl IngestionPipeline {
    pub fn new(
        config: BridgeConfig,
        directory: Arc<dyn ContactDirectory>,
        store: Arc<dyn CallRecordStore>,
    ) -> Self {
        Self {
            config,
            directory,
            store,
        }
    }

    /// Run the ingestion loop
    ///
    /// Returns only when the store becomes unavailable; the session layer
    /// absorbs every transport fault internally.
    pub async fn run(&self) -> Result<()> {
        let mut session = SessionManager::new(
            self.config.ami.clone(),
            self.config.reconnect_delay,
            self.config.connect_timeout,
        );
        loop {
            let msg = session.next_message().await;
            if msg.is_response() {
                debug!(
                    "discarding solicited response ({})",
                    msg.get("Response").unwrap_or("-")
                );
                continue;
            }
            // Everything that is not a dial completion drops here, without
            // side effects; the manager emits far more than we keep.
            let Some(event) = extract_dial_completion(msg) else {
                continue;
            };
            self.process(event).await?;
        }
    }

    /// Correlate, persist, and narrate one accepted event
    async fn process(&self, event: DialCompletionEvent) -> Result<()> {
        let contact = self.correlate(event.dialed_10.as_deref()).await;
        let record = CallRecord::new(event, contact);
        match self.store.append(&record).await {
            Ok(()) => {
                self.narrate(&record);
                Ok(())
            }
            Err(e @ StoreError::Unavailable(_)) => {
                error!("store unavailable, ending the ingestion loop: {}", e);
                Err(e.into())
            }
            Err(e) => {
                warn!(
                    "dropping event uniqueid={} after store rejection: {}",
                    dash(&record.uniqueid),
                    e
                );
                Ok(())
            }
        }
    }

    /// Resolve the contact for a normalized number, if there is one
    ///
    /// A lookup failure degrades to a miss: the event is still persisted,
    /// just without contact fields. Real store unavailability surfaces on
    /// the insert that follows.
    async fn correlate(&self, phone10: Option<&str>) -> Option<ContactMatch> {
        let phone10 = phone10?;
        match self.directory.find_by_phone(phone10).await {
            Ok(found) => found,
            Err(e) => {
                error!("contact lookup for {} failed: {}", phone10, e);
                None
            }
        }
    }

    fn narrate(&self, record: &CallRecord) {
        match (record.dialed_10.as_deref(), record.contract_id.as_deref()) {
            (Some(dialed), Some(contract)) => info!(
                "match: ext={} dialed={} -> {} contract={} disposition={}",
                dash(&record.src_extension),
                dash(&record.dialed_raw),
                dialed,
                contract,
                dash(&record.disposition)
            ),
            (Some(dialed), None) => info!(
                "no match: ext={} dialed={} -> {} disposition={}",
                dash(&record.src_extension),
                dash(&record.dialed_raw),
                dialed,
                dash(&record.disposition)
            ),
            (None, _) => debug!(
                "dialed string did not normalize: ext={} dialed={}",
                dash(&record.src_extension),
                dash(&record.dialed_raw)
            ),
        }
    }
}

fn dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AmiConfig, StoreConfig};
    use crate::directory::{DirectoryError, MemoryContactDirectory};
    use crate::error::BridgeError;
    use crate::store::MemoryCallRecordStore;
    use amibridge_ami_core::RawMessage;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_pipeline(
        directory: Arc<dyn ContactDirectory>,
        store: Arc<dyn CallRecordStore>,
    ) -> IngestionPipeline {
        let config = BridgeConfig::new(
            AmiConfig {
                host: "127.0.0.1".into(),
                port: 5038,
                username: "bridge".into(),
                secret: "s3cret".into(),
            },
            StoreConfig {
                host: "127.0.0.1".into(),
                port: 5432,
                database: "calls".into(),
                user: "ingest".into(),
                password: "pg".into(),
            },
        );
        IngestionPipeline::new(config, directory, store)
    }

    fn event(dialed_10: Option<&str>) -> DialCompletionEvent {
        DialCompletionEvent {
            event_time: Utc::now(),
            uniqueid: Some("1.1".into()),
            linkedid: None,
            src_extension: Some("1004".into()),
            dialed_raw: Some("raw".into()),
            dialed_10: dialed_10.map(str::to_string),
            disposition: Some("ANSWER".into()),
            channel: None,
            raw: RawMessage::parse("Event: DialEnd"),
        }
    }

    struct CountingDirectory {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContactDirectory for CountingDirectory {
        async fn find_by_phone(
            &self,
            _phone10: &str,
        ) -> std::result::Result<Option<ContactMatch>, DirectoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    struct FailingDirectory;

    #[async_trait]
    impl ContactDirectory for FailingDirectory {
        async fn find_by_phone(
            &self,
            _phone10: &str,
        ) -> std::result::Result<Option<ContactMatch>, DirectoryError> {
            Err(DirectoryError::Lookup(sqlx::Error::PoolClosed))
        }
    }

    struct UnavailableStore;

    #[async_trait]
    impl CallRecordStore for UnavailableStore {
        async fn append(&self, _record: &CallRecord) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable(sqlx::Error::PoolClosed))
        }
    }

    struct RejectingStore;

    #[async_trait]
    impl CallRecordStore for RejectingStore {
        async fn append(&self, _record: &CallRecord) -> std::result::Result<(), StoreError> {
            Err(StoreError::Rejected(sqlx::Error::RowNotFound))
        }
    }

    #[tokio::test]
    async fn correlation_is_skipped_without_a_normalized_number() {
        let directory = Arc::new(CountingDirectory {
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(MemoryCallRecordStore::new());
        let pipeline = test_pipeline(directory.clone(), store.clone());

        pipeline.process(event(None)).await.unwrap();

        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.len(), 1);
        assert!(!store.records()[0].is_matched());
    }

    #[tokio::test]
    async fn lookup_failure_degrades_to_a_miss_and_still_persists() {
        let store = Arc::new(MemoryCallRecordStore::new());
        let pipeline = test_pipeline(Arc::new(FailingDirectory), store.clone());

        pipeline.process(event(Some("5512345678"))).await.unwrap();

        assert_eq!(store.len(), 1);
        let record = &store.records()[0];
        assert!(!record.is_matched());
        assert_eq!(record.dialed_10.as_deref(), Some("5512345678"));
    }

    #[tokio::test]
    async fn rejected_record_is_dropped_and_the_loop_survives() {
        let pipeline = test_pipeline(
            Arc::new(MemoryContactDirectory::new()),
            Arc::new(RejectingStore),
        );
        pipeline.process(event(Some("5512345678"))).await.unwrap();
    }

    #[tokio::test]
    async fn unavailable_store_ends_processing() {
        let pipeline = test_pipeline(
            Arc::new(MemoryContactDirectory::new()),
            Arc::new(UnavailableStore),
        );
        let err = pipeline.process(event(Some("5512345678"))).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Store(StoreError::Unavailable(_))
        ));
    }
}
