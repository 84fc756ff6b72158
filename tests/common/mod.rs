//! Shared test doubles for the integration tests.
//!
//! `FakeRecordStore` understands exactly the statements the record service
//! generates. Each table has a column order, set by `define` or by the first
//! upsert; statements are matched against it by column name.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use resource_cache::{CacheBackend, CacheError, Row, StoreError, TransactionHandle, Value};

// == Fake Record Store ==
#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Vec<Value>>>,
    schemas: HashMap<String, Vec<String>>,
    fail_tables: HashSet<String>,
    fail_queries: bool,
    queries: Vec<(String, Vec<Value>)>,
    batches: Vec<String>,
    transactions_begun: usize,
    commits: usize,
    rollbacks: usize,
    open_transactions: usize,
}

#[derive(Clone, Default)]
pub struct FakeRecordStore {
    state: Arc<Mutex<State>>,
}

impl FakeRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Fixes the stored column order of `table`.
    pub fn define(&self, table: &str, columns: &[&str]) {
        self.state().schemas.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
    }

    /// Appends a row as-is, duplicates included.
    pub fn seed(&self, table: &str, row: Vec<Value>) {
        self.state()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Changes a row directly, the way an external writer would.
    pub fn update_column(&self, table: &str, key: &Value, column: usize, value: Value) {
        let mut state = self.state();
        let rows = state.tables.entry(table.to_string()).or_default();
        for row in rows.iter_mut().filter(|r| &r[0] == key) {
            row[column] = value.clone();
        }
    }

    pub fn rows(&self, table: &str) -> Vec<Vec<Value>> {
        self.state().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn fail_batches_for(&self, table: &str) {
        self.state().fail_tables.insert(table.to_string());
    }

    pub fn fail_queries(&self) {
        self.state().fail_queries = true;
    }

    pub fn query_count(&self) -> usize {
        self.state().queries.len()
    }

    pub fn last_query(&self) -> Option<(String, Vec<Value>)> {
        self.state().queries.last().cloned()
    }

    pub fn batches(&self) -> Vec<String> {
        self.state().batches.clone()
    }

    pub fn transactions_begun(&self) -> usize {
        self.state().transactions_begun
    }

    pub fn commits(&self) -> usize {
        self.state().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state().rollbacks
    }

    pub fn open_transactions(&self) -> usize {
        self.state().open_transactions
    }
}

fn between<'a>(sql: &'a str, start: &str, end: &str) -> &'a str {
    let from = sql.find(start).map(|i| i + start.len()).unwrap_or(0);
    let rest = &sql[from..];
    let to = rest.find(end).unwrap_or(rest.len());
    &rest[..to]
}

fn column_list(text: &str, separator: &str) -> Vec<String> {
    text.split(separator)
        .map(|c| c.trim().trim_end_matches("=?").to_string())
        .collect()
}

fn run_query(state: &State, sql: &str, params: &[Value]) -> Vec<Row> {
    let selected = column_list(between(sql, "SELECT ", " FROM "), ",");
    let table = between(sql, " FROM ", " ");
    let schema = state.schemas.get(table).unwrap_or(&selected);
    let index_of = |name: &str| schema.iter().position(|c| c == name).unwrap_or(0);

    let key = sql
        .contains(" WHERE ")
        .then(|| index_of(between(sql, " WHERE ", " ")));
    let projection: Vec<usize> = selected.iter().map(|c| index_of(c)).collect();

    let rows = state.tables.get(table).cloned().unwrap_or_default();
    rows.into_iter()
        .filter(|row| key.map_or(true, |k| params.contains(&row[k])))
        .map(|row| Row::new(projection.iter().map(|&i| row[i].clone()).collect()))
        .collect()
}

/// An upsert batch checked and ready to apply.
struct Upsert {
    table: String,
    /// Assigned columns in statement order, primary key first
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Checks an upsert batch: parameter count and update clause order.
fn parse_upsert(state: &State, sql: &str, rows: &[Vec<Value>]) -> Result<Upsert, StoreError> {
    let table = between(sql, "INSERT INTO ", " SET").to_string();
    if state.fail_tables.contains(&table) {
        return Err(StoreError::Statement(format!("injected failure on {table}")));
    }

    let names = column_list(between(sql, " SET ", " ON DUPLICATE KEY UPDATE"), ", ");
    let columns = names.len();
    let mut full_rows = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() < columns {
            return Err(StoreError::Statement(format!(
                "{table} expects {columns} values, got {}",
                row.len()
            )));
        }
        let (assigned, updated) = row.split_at(columns);
        if updated != &assigned[1..] {
            return Err(StoreError::Statement(format!(
                "update clause of {table} bound out of order"
            )));
        }
        full_rows.push(assigned.to_vec());
    }
    Ok(Upsert {
        table,
        columns: names,
        rows: full_rows,
    })
}

fn apply_upsert(state: &mut State, upsert: Upsert) -> u64 {
    let schema = state
        .schemas
        .entry(upsert.table.clone())
        .or_insert_with(|| upsert.columns.clone())
        .clone();
    let key = schema
        .iter()
        .position(|c| *c == upsert.columns[0])
        .unwrap_or(0);

    let stored = state.tables.entry(upsert.table).or_default();
    let mut affected = 0;
    for assigned in upsert.rows {
        let row: Vec<Value> = schema
            .iter()
            .map(|name| {
                upsert
                    .columns
                    .iter()
                    .position(|c| c == name)
                    .map_or(Value::Null, |i| assigned[i].clone())
            })
            .collect();
        match stored.iter_mut().find(|r| r[key] == row[key]) {
            Some(existing) => *existing = row,
            None => stored.push(row),
        }
        affected += 1;
    }
    affected
}

#[async_trait]
impl resource_cache::RecordStore for FakeRecordStore {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError> {
        let mut state = self.state();
        state.queries.push((sql.to_string(), params.to_vec()));
        if state.fail_queries {
            return Err(StoreError::Connection("injected query failure".to_string()));
        }
        Ok(run_query(&state, sql, params))
    }

    async fn execute_batch(&self, sql: &str, rows: &[Vec<Value>]) -> Result<u64, StoreError> {
        let mut state = self.state();
        let upsert = parse_upsert(&state, sql, rows)?;
        state.batches.push(sql.to_string());
        Ok(apply_upsert(&mut state, upsert))
    }

    async fn begin_transaction(&self) -> Result<Box<dyn TransactionHandle>, StoreError> {
        let mut state = self.state();
        state.transactions_begun += 1;
        state.open_transactions += 1;
        Ok(Box::new(FakeTransaction {
            state: Arc::clone(&self.state),
            staged: Vec::new(),
            finished: false,
        }))
    }
}

// == Fake Transaction ==
/// Stages batches until commit; rollback or drop discards them.
struct FakeTransaction {
    state: Arc<Mutex<State>>,
    staged: Vec<(String, Upsert)>,
    finished: bool,
}

impl FakeTransaction {
    fn finish(&mut self, committed: bool) {
        let mut state = self.state.lock().unwrap();
        state.open_transactions -= 1;
        if committed {
            state.commits += 1;
            for (sql, upsert) in self.staged.drain(..) {
                state.batches.push(sql);
                apply_upsert(&mut state, upsert);
            }
        } else {
            state.rollbacks += 1;
            self.staged.clear();
        }
        self.finished = true;
    }
}

#[async_trait]
impl TransactionHandle for FakeTransaction {
    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<Value>]) -> Result<u64, StoreError> {
        let upsert = parse_upsert(&self.state.lock().unwrap(), sql, rows)?;
        let affected = upsert.rows.len() as u64;
        self.staged.push((sql.to_string(), upsert));
        Ok(affected)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = self;
        this.finish(true);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = self;
        this.finish(false);
        Ok(())
    }
}

impl Drop for FakeTransaction {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(false);
        }
    }
}

// == Failing Cache ==
/// A cache backend that is always down.
#[derive(Default)]
pub struct FailingCache;

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn put(&self, _: &str, _: Vec<u8>, _: Option<Duration>) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}
