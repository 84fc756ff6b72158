//! The relational backend the record service consumes.
//!
//! Connection handling and statement execution live in the driver behind
//! these traits. Parameters arrive positionally, already checked against
//! their column types.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::Value;

// == Row ==
/// One result row, indexable by column position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

// == Record Store ==
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Runs a query with one row of parameters. Only committed rows are visible.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError>;

    /// Runs `sql` once per parameter row as a single batch, outside any
    /// transaction. Returns the affected row count.
    async fn execute_batch(&self, sql: &str, rows: &[Vec<Value>]) -> Result<u64, StoreError>;

    /// Starts a transaction owned by the caller.
    async fn begin_transaction(&self) -> Result<Box<dyn TransactionHandle>, StoreError>;
}

// == Transaction Handle ==
/// An open transaction.
///
/// The owner must finish it with [`commit`](Self::commit) or
/// [`rollback`](Self::rollback) on every path. Implementations roll back a
/// handle that is dropped unfinished.
#[async_trait]
pub trait TransactionHandle: Send {
    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<Value>]) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
