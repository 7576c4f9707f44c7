use std::{marker::PhantomData, path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use log::{debug, error, info, trace, warn};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{Contact, FileStore, KeyValueStore, MemoryStore, Result, ServiceLogError, ServiceRecord};

/// A record kind persisted as one JSON array under a fixed key.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Fields supplied on creation (everything except `id` and timestamps).
    type Draft: Send;
    /// Partial update merged onto an existing record.
    type Patch: Send;

    /// Storage key of the collection.
    const KEY: &'static str;
    /// Human readable name used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn from_draft(id: String, now: DateTime<Utc>, draft: Self::Draft) -> Self;

    fn apply_patch(&mut self, patch: Self::Patch);
}

/// Result of a lenient read: a corrupt blob yields no records plus a
/// description of what went wrong.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub records: Vec<T>,
    pub corruption: Option<String>,
}

impl<T> Snapshot<T> {
    pub fn is_corrupt(&self) -> bool {
        self.corruption.is_some()
    }
}

/// The persisted collection of one record kind.
///
/// Every mutation reads the whole collection and writes it back in one
/// `set`. Mutations on the same collection are queued (FIFO) behind a single
/// async lock, so a read-modify-write never interleaves with another one.
pub struct Collection<T> {
    store: Arc<dyn KeyValueStore>,
    write_queue: Arc<Mutex<()>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            write_queue: Arc::clone(&self.write_queue),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_queue: Arc::new(Mutex::new(())),
            _entity: PhantomData,
        }
    }

    /// All records in stored order (newest first by convention).
    pub async fn list(&self) -> Result<Vec<T>> {
        let Some(blob) = self.store.get(T::KEY).await? else {
            trace!("No data stored under '{}'", T::KEY);
            return Ok(Vec::new());
        };

        serde_json::from_str::<Vec<T>>(&blob).map_err(|e| {
            error!("Stored data under '{}' could not be decoded: {}", T::KEY, e);
            ServiceLogError::StorageRead {
                key: T::KEY.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Like [`list`](Self::list) but never fails on a corrupt blob.
    pub async fn snapshot(&self) -> Result<Snapshot<T>> {
        match self.list().await {
            Ok(records) => Ok(Snapshot {
                records,
                corruption: None,
            }),
            Err(ServiceLogError::StorageRead { message, .. }) => {
                warn!(
                    "Showing no {} records because stored data is corrupt",
                    T::KIND
                );
                Ok(Snapshot {
                    records: Vec::new(),
                    corruption: Some(message),
                })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>> {
        Ok(self.list().await?.into_iter().find(|r| r.id() == id))
    }

    /// Creates a record with a fresh id and prepends it to the collection.
    pub async fn create(&self, draft: T::Draft) -> Result<T> {
        let _queued = self.write_queue.lock().await;
        let mut records = self.list().await?;

        let mut id = Uuid::new_v4().to_string();
        while records.iter().any(|r| r.id() == id) {
            id = Uuid::new_v4().to_string();
        }

        let record = T::from_draft(id, Utc::now(), draft);
        records.insert(0, record.clone());
        self.write(&records).await?;

        info!("Created {} {}", T::KIND, record.id());
        Ok(record)
    }

    /// Merges `patch` onto the record with `id`.
    pub async fn update(&self, id: &str, patch: T::Patch) -> Result<T> {
        let _queued = self.write_queue.lock().await;
        let mut records = self.list().await?;

        let Some(record) = records.iter_mut().find(|r| r.id() == id) else {
            error!("Cannot update {} {}: not found", T::KIND, id);
            return Err(ServiceLogError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            });
        };
        record.apply_patch(patch);
        let updated = record.clone();

        self.write(&records).await?;
        info!("Updated {} {}", T::KIND, id);
        Ok(updated)
    }

    /// Removes the record with `id`. Deleting a missing id changes nothing.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let _queued = self.write_queue.lock().await;
        let mut records = self.list().await?;

        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            debug!("{} {} already absent, nothing to delete", T::KIND, id);
            return Ok(());
        }

        self.write(&records).await?;
        info!("Deleted {} {}", T::KIND, id);
        Ok(())
    }

    /// Drops the whole stored collection.
    pub async fn clear(&self) -> Result<()> {
        let _queued = self.write_queue.lock().await;
        self.store.remove(T::KEY).await?;
        info!("Cleared all {} records", T::KIND);
        Ok(())
    }

    async fn write(&self, records: &[T]) -> Result<()> {
        let json = serde_json::to_string(records).map_err(|e| {
            error!("Failed to serialize {} records: {}", T::KIND, e);
            ServiceLogError::Serialization(e)
        })?;
        trace!("Writing {} records under '{}'", records.len(), T::KEY);
        self.store.set(T::KEY, json).await
    }
}

/// Both persisted collections over one backend.
#[derive(Clone)]
pub struct Storage {
    pub services: Collection<ServiceRecord>,
    pub contacts: Collection<Contact>,
}

impl Storage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            services: Collection::new(Arc::clone(&store)),
            contacts: Collection::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Opens file-backed storage under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(FileStore::open(data_dir)?)))
    }

    /// Removes every stored service record and contact.
    pub async fn reset_all(&self) -> Result<()> {
        self.services.clear().await?;
        self.contacts.clear().await?;
        info!("All stored data has been reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{Category, ContactDraft, ServiceDate, ServiceDraft, ServicePatch};

    fn draft(item: &str) -> ServiceDraft {
        ServiceDraft {
            category: Category::HomeAppliances,
            item_name: item.to_string(),
            repair_type: "Filter replacement".to_string(),
            date: ServiceDate::parse("03 - 14 - 2025").unwrap(),
            cost: "45".to_string(),
            note: Some("under warranty".to_string()),
            image: None,
        }
    }

    /// Yields to the scheduler around every operation so unsynchronised
    /// read-modify-write cycles would interleave.
    struct YieldingStore(MemoryStore);

    #[async_trait]
    impl KeyValueStore for YieldingStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            tokio::task::yield_now().await;
            let value = self.0.get(key).await;
            tokio::task::yield_now().await;
            value
        }

        async fn set(&self, key: &str, value: String) -> Result<()> {
            tokio::task::yield_now().await;
            self.0.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.0.remove(key).await
        }
    }

    /// Reads back a fixed blob; every write fails.
    struct FailingStore(Option<String>);

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.0.clone().filter(|_| key == ServiceRecord::KEY))
        }

        async fn set(&self, _key: &str, _value: String) -> Result<()> {
            Err(ServiceLogError::Io(std::io::Error::other("disk full")))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn create_then_list_round_trip() {
        let storage = Storage::in_memory();
        let created = storage.services.create(draft("Dishwasher")).await.unwrap();

        let records = storage.services.list().await.unwrap();
        assert_eq!(records, vec![created.clone()]);
        assert_eq!(created.item_name, "Dishwasher");
        assert_eq!(created.date, "03 - 14 - 2025");
        assert_eq!(created.note.as_deref(), Some("under warranty"));
        assert!(!created.id.is_empty());
    }

    #[tokio::test]
    async fn create_prepends() {
        let storage = Storage::in_memory();
        let first = storage.services.create(draft("Fridge")).await.unwrap();
        let second = storage.services.create(draft("Oven")).await.unwrap();

        let ids: Vec<String> = storage
            .services
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn delete_missing_id_is_a_no_op() {
        let storage = Storage::in_memory();
        storage.services.create(draft("Washer")).await.unwrap();
        let before = storage.services.list().await.unwrap();

        storage.services.delete("does-not-exist").await.unwrap();
        assert_eq!(storage.services.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_removes_only_the_target() {
        let storage = Storage::in_memory();
        let keep = storage.services.create(draft("Washer")).await.unwrap();
        let gone = storage.services.create(draft("Dryer")).await.unwrap();

        storage.services.delete(&gone.id).await.unwrap();
        assert_eq!(storage.services.list().await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn update_merges_only_given_fields() {
        let storage = Storage::in_memory();
        let other = storage.services.create(draft("Heater")).await.unwrap();
        let target = storage.services.create(draft("Boiler")).await.unwrap();
        let other_json = serde_json::to_string(&other).unwrap();

        let updated = storage
            .services
            .update(
                &target.id,
                ServicePatch {
                    cost: Some("500".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.cost, "500");
        assert_eq!(
            ServiceRecord {
                cost: target.cost.clone(),
                ..updated.clone()
            },
            target
        );

        let stored = storage.services.list().await.unwrap();
        assert_eq!(stored[0], updated);
        assert_eq!(serde_json::to_string(&stored[1]).unwrap(), other_json);
    }

    #[tokio::test]
    async fn update_missing_id_reports_not_found() {
        let storage = Storage::in_memory();
        let result = storage
            .services
            .update("nope", ServicePatch::default())
            .await;
        assert!(matches!(
            result,
            Err(ServiceLogError::NotFound { id, .. }) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn corrupt_blob_is_distinguished_from_empty() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(ServiceRecord::KEY, "{not json".to_string())
            .await
            .unwrap();
        let storage = Storage::new(store);

        assert!(matches!(
            storage.services.list().await,
            Err(ServiceLogError::StorageRead { .. })
        ));

        let snapshot = storage.services.snapshot().await.unwrap();
        assert!(snapshot.records.is_empty());
        assert!(snapshot.is_corrupt());

        let empty = storage.contacts.snapshot().await.unwrap();
        assert!(!empty.is_corrupt());

        // A mutation must not paper over the corrupt blob.
        assert!(storage.services.create(draft("Tv")).await.is_err());
    }

    #[tokio::test]
    async fn write_failures_propagate() {
        let seeded = Storage::in_memory();
        let existing = seeded.services.create(draft("Modem")).await.unwrap();
        let blob = serde_json::to_string(&vec![existing.clone()]).unwrap();

        let storage = Storage::new(Arc::new(FailingStore(Some(blob))));
        assert!(matches!(
            storage.services.create(draft("Router")).await,
            Err(ServiceLogError::Io(_))
        ));
        assert!(matches!(
            storage
                .services
                .update(
                    &existing.id,
                    ServicePatch {
                        cost: Some("60".to_string()),
                        ..Default::default()
                    },
                )
                .await,
            Err(ServiceLogError::Io(_))
        ));
        assert!(matches!(
            storage.services.delete(&existing.id).await,
            Err(ServiceLogError::Io(_))
        ));
        assert_eq!(storage.services.list().await.unwrap(), vec![existing]);
    }

    #[tokio::test]
    async fn concurrent_updates_both_survive() {
        let storage = Storage::new(Arc::new(YieldingStore(MemoryStore::new())));
        let record = storage.services.create(draft("Car")).await.unwrap();

        let cost = storage.services.update(
            &record.id,
            ServicePatch {
                cost: Some("250".to_string()),
                ..Default::default()
            },
        );
        let note = storage.services.update(
            &record.id,
            ServicePatch {
                note: Some(Some("new tyres".to_string())),
                ..Default::default()
            },
        );
        let (a, b) = tokio::join!(cost, note);
        a.unwrap();
        b.unwrap();

        let stored = storage.services.get(&record.id).await.unwrap().unwrap();
        assert_eq!(stored.cost, "250");
        assert_eq!(stored.note.as_deref(), Some("new tyres"));
    }

    #[tokio::test]
    async fn concurrent_creates_are_all_kept() {
        let storage = Storage::new(Arc::new(YieldingStore(MemoryStore::new())));
        let contacts = storage.contacts.clone();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let contacts = contacts.clone();
                tokio::spawn(async move {
                    contacts
                        .create(ContactDraft {
                            name: format!("Provider {i}"),
                            phone: format!("555-010{i}"),
                            specialty: None,
                            email: None,
                            address: None,
                        })
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = storage.contacts.list().await.unwrap();
        assert_eq!(stored.len(), 8);
        let mut ids: Vec<&str> = stored.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[tokio::test]
    async fn reset_all_clears_both_collections() {
        let storage = Storage::in_memory();
        storage.services.create(draft("Alarm")).await.unwrap();
        storage
            .contacts
            .create(ContactDraft {
                name: "Locksmith".to_string(),
                phone: "555".to_string(),
                specialty: Some("security".to_string()),
                email: None,
                address: None,
            })
            .await
            .unwrap();

        storage.reset_all().await.unwrap();
        assert!(storage.services.list().await.unwrap().is_empty());
        assert!(storage.contacts.list().await.unwrap().is_empty());
    }
}
