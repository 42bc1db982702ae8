//! MongoDB access for the tracking store
//!
//! A thin typed wrapper exposing exactly the operations the location store
//! performs: append a sample (`insert_one`), read the roster (`find_many`),
//! and apply a position update returning the fresh record
//! (`find_one_and_update`). Schemas declare their own indexes through
//! `IntoIndexes`; collections apply them on first open.

use bson::{doc, oid::ObjectId, Document};
use mongodb::{
    options::{IndexOptions, ReturnDocument, UpdateModifications},
    Client, Database, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::EventOpsError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// Handle to the EventOps database
#[derive(Clone)]
pub struct MongoClient {
    db: Database,
}

impl MongoClient {
    /// Connect and verify the database is reachable.
    ///
    /// Short selection/connect timeouts are appended to the URI so an
    /// unreachable MongoDB fails startup quickly instead of hanging.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, EventOpsError> {
        info!("Connecting to MongoDB at {}", uri);

        let sep = if uri.contains('?') { '&' } else { '?' };
        let timeout_uri = format!("{}{}serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri, sep);

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| EventOpsError::Database(format!("Failed to connect to MongoDB: {}", e)))?;
        let db = client.database(db_name);

        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| EventOpsError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self { db })
    }

    /// Open a typed collection, applying its schema-declared indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, EventOpsError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::open(&self.db, name).await
    }
}

/// Typed collection limited to the store's operations
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: mongodb::Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    async fn open(db: &Database, name: &str) -> Result<Self, EventOpsError> {
        let collection = Self {
            inner: db.collection::<T>(name),
        };
        collection.apply_indexes().await?;
        Ok(collection)
    }

    async fn apply_indexes(&self) -> Result<(), EventOpsError> {
        let schema_indices = T::into_indices();
        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| EventOpsError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, stamping its metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, EventOpsError> {
        item.mut_metadata().stamp_created();

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| EventOpsError::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| EventOpsError::Database("Failed to get inserted ID".into()))
    }

    /// Find all documents matching the filter, soft-deleted ones excluded.
    /// A document that fails to decode is logged and skipped, not fatal.
    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, EventOpsError> {
        use futures_util::StreamExt;

        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        let cursor = self
            .inner
            .find(full_filter)
            .await
            .map_err(|e| EventOpsError::Database(format!("Find failed: {}", e)))?;

        let results: Vec<T> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    /// Update one document and return the post-update state.
    ///
    /// Last-write-wins by arrival order: there is no per-user guard, the most
    /// recently applied update is the one that sticks.
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<Option<T>, EventOpsError> {
        self.inner
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| EventOpsError::Database(format!("Update failed: {}", e)))
    }
}
