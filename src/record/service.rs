//! Cache-aside loading and batched upserts of descriptor-driven records.
//!
//! Reads:
//! - `load_by_key` answers from the cache when it can and fills it on a miss.
//! - `load_bulk` and `load_all` always query, then refresh the cache with
//!   every row they return.
//!
//! Writes never touch the cache. Whoever changes a row, through `save` or
//! behind this layer's back, calls `forget` for it; record entries do not
//! heal themselves through expiry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cache::{CacheBackend, FailOpenCache};
use crate::config::{Config, DEFAULT_TRANSACTION_THRESHOLD};
use crate::error::{ResourceError, Result};
use crate::record::sql::{self, PreparedStatement};
use crate::record::{Record, RecordDescriptor, RecordStore, Row, Value};

// == Record Store Service ==
pub struct RecordStoreService<C: ?Sized, S: ?Sized> {
    store: Arc<S>,
    cache: FailOpenCache<C>,
    transaction_threshold: usize,
    record_ttl: Option<Duration>,
}

impl<C, S> RecordStoreService<C, S>
where
    C: CacheBackend + ?Sized,
    S: RecordStore + ?Sized,
{
    pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
        Self {
            store,
            cache: FailOpenCache::new(cache),
            transaction_threshold: DEFAULT_TRANSACTION_THRESHOLD,
            record_ttl: None,
        }
    }

    pub fn from_config(config: &Config, store: Arc<S>, cache: Arc<C>) -> Self {
        Self::new(store, cache)
            .with_transaction_threshold(config.transaction_threshold)
            .with_record_ttl(config.record_ttl())
    }

    /// `save` opens a transaction when given more than `threshold` records.
    pub fn with_transaction_threshold(mut self, threshold: usize) -> Self {
        self.transaction_threshold = threshold;
        self
    }

    /// TTL hint for cached records, None = backend default.
    pub fn with_record_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.record_ttl = ttl;
        self
    }

    /// Backend failures absorbed so far.
    pub fn cache_faults(&self) -> u64 {
        self.cache.faults()
    }

    // == Load By Key ==
    /// Loads the record whose primary key is `key`.
    ///
    /// Returns `Ok(None)` unless the table holds exactly one matching row.
    pub async fn load_by_key(
        &self,
        descriptor: &Arc<RecordDescriptor>,
        key: &Value,
    ) -> Result<Option<Record>> {
        let cache_key = descriptor.cache_key(key)?;

        if let Some(payload) = self.cache.lookup(&cache_key).await {
            let mut record = descriptor.new_record();
            match record.populate_from_bytes(&payload) {
                Ok(()) => return Ok(Some(record)),
                Err(e) => {
                    warn!(key = %cache_key, error = %e, "undecodable record cache entry, evicting");
                    self.cache.evict(&cache_key).await;
                }
            }
        }

        let mut statement = PreparedStatement::new(sql::select_by_key_sql(descriptor));
        descriptor.primary_key_type().bind(&mut statement, 1, key)?;
        debug!(sql = statement.sql(), "loading record");

        let rows = self
            .store
            .query(statement.sql(), &statement.params()?)
            .await?;
        if rows.len() != 1 {
            info!(
                table = descriptor.table_name(),
                key = %key,
                rows = rows.len(),
                "lookup did not match exactly one row"
            );
            return Ok(None);
        }

        let record = self.record_from_row(descriptor, &rows[0])?;
        self.cache_record(&record).await;
        Ok(Some(record))
    }

    // == Load Bulk ==
    /// Loads every record whose primary key is in `keys` with one query.
    ///
    /// The cache is not consulted; every returned row is written back to it.
    /// Keys without a row are simply absent from the result.
    pub async fn load_bulk(
        &self,
        descriptor: &Arc<RecordDescriptor>,
        keys: &[Value],
    ) -> Result<Vec<Record>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut statement = PreparedStatement::new(sql::select_in_sql(descriptor, keys.len()));
        let key_type = descriptor.primary_key_type();
        for (i, key) in keys.iter().enumerate() {
            key_type.bind(&mut statement, i + 1, key)?;
        }
        self.load_from_query(descriptor, &statement).await
    }

    // == Load All ==
    /// Loads the whole table, refreshing the cache with every row.
    pub async fn load_all(&self, descriptor: &Arc<RecordDescriptor>) -> Result<Vec<Record>> {
        let statement = PreparedStatement::new(sql::select_all_sql(descriptor));
        self.load_from_query(descriptor, &statement).await
    }

    async fn load_from_query(
        &self,
        descriptor: &Arc<RecordDescriptor>,
        statement: &PreparedStatement,
    ) -> Result<Vec<Record>> {
        debug!(sql = statement.sql(), "loading records");
        let rows = self
            .store
            .query(statement.sql(), &statement.params()?)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = self.record_from_row(descriptor, row)?;
            self.cache_record(&record).await;
            records.push(record);
        }
        Ok(records)
    }

    fn record_from_row(&self, descriptor: &Arc<RecordDescriptor>, row: &Row) -> Result<Record> {
        let mut record = descriptor.new_record();
        record.populate_from_row(row)?;
        Ok(record)
    }

    async fn cache_record(&self, record: &Record) {
        let encoded = record
            .cache_key()
            .and_then(|key| record.to_bytes().map(|bytes| (key, bytes)));
        match encoded {
            Ok((key, bytes)) => {
                self.cache.fill(&key, bytes, self.record_ttl).await;
            }
            Err(e) => warn!(
                table = record.descriptor().table_name(),
                error = %e,
                "record not cacheable"
            ),
        }
    }

    // == Forget ==
    /// Drops the cached copy of `record`.
    pub async fn forget(&self, record: &Record) -> Result<()> {
        let key = record.cache_key()?;
        debug!(key = %key, "forgetting cached record");
        self.cache.evict(&key).await;
        Ok(())
    }

    // == Save ==
    /// Upserts `records`, one batched statement per table.
    ///
    /// More than `transaction_threshold` records run inside one transaction:
    /// if any table's batch fails, every table's changes are rolled back.
    /// Smaller inputs run without a transaction and stop at the first failing
    /// table. Returns the affected row count reported by the store.
    pub async fn save(&self, records: &[Record]) -> Result<u64> {
        let statements = self.upsert_statements(records)?;
        if statements.is_empty() {
            return Ok(0);
        }

        if records.len() > self.transaction_threshold {
            self.save_in_transaction(&statements).await
        } else {
            let mut affected = 0;
            for statement in &statements {
                affected += self
                    .store
                    .execute_batch(statement.sql(), statement.batch())
                    .await?;
            }
            Ok(affected)
        }
    }

    /// Groups `records` by descriptor, in order of first appearance, and binds
    /// one upsert batch per group. Two descriptors mapping the same table with
    /// different column layouts get separate statements. Binding errors
    /// surface before anything runs.
    fn upsert_statements(&self, records: &[Record]) -> Result<Vec<PreparedStatement>> {
        let mut groups: Vec<(&Arc<RecordDescriptor>, Vec<&Record>)> = Vec::new();
        for record in records {
            let descriptor = record.descriptor();
            match groups
                .iter_mut()
                .find(|(d, _)| Arc::ptr_eq(d, descriptor) || ***d == **descriptor)
            {
                Some((_, group)) => group.push(record),
                None => groups.push((descriptor, vec![record])),
            }
        }

        groups
            .into_iter()
            .map(|(descriptor, group)| {
                let mut statement = PreparedStatement::new(sql::upsert_sql(descriptor));
                for record in group {
                    sql::bind_upsert(&mut statement, record)?;
                }
                Ok(statement)
            })
            .collect()
    }

    async fn save_in_transaction(&self, statements: &[PreparedStatement]) -> Result<u64> {
        let mut transaction = self.store.begin_transaction().await?;
        let mut affected = 0;

        for statement in statements {
            match transaction
                .execute_batch(statement.sql(), statement.batch())
                .await
            {
                Ok(n) => affected += n,
                Err(e) => {
                    error!(sql = statement.sql(), error = %e, "batch failed, rolling back");
                    if let Err(rollback_err) = transaction.rollback().await {
                        error!(error = %rollback_err, "rollback failed");
                    }
                    return Err(ResourceError::StorageFault(e));
                }
            }
        }

        transaction.commit().await?;
        debug!(statements = statements.len(), affected, "transaction committed");
        Ok(affected)
    }
}
