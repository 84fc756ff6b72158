//! Statement text generation and positional parameter binding.
//!
//! Table and column names come from validated descriptors, so the generated
//! text only ever contains identifiers, keywords and `?` placeholders.

use crate::error::{ResourceError, Result};
use crate::record::{Record, RecordDescriptor, Value};

// == Prepared Statement ==
/// Statement text plus one or more rows of positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    sql: String,
    arity: usize,
    current: Vec<Option<Value>>,
    batch: Vec<Vec<Value>>,
}

impl PreparedStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let arity = sql.matches('?').count();
        Self {
            sql,
            arity,
            current: vec![None; arity],
            batch: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of placeholders.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Sets the 1-based `position` of the current parameter row.
    ///
    /// Prefer [`ColumnType::bind`](crate::record::ColumnType::bind), which
    /// checks the value against the column type first.
    pub fn set(&mut self, position: usize, value: Value) -> Result<()> {
        if position == 0 || position > self.arity {
            return Err(ResourceError::Binding(format!(
                "position {} outside 1..={} in `{}`",
                position, self.arity, self.sql
            )));
        }
        self.current[position - 1] = Some(value);
        Ok(())
    }

    /// The current parameter row; every position must be bound.
    pub fn params(&self) -> Result<Vec<Value>> {
        self.current
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.clone().ok_or_else(|| {
                    ResourceError::Binding(format!("position {} unbound in `{}`", i + 1, self.sql))
                })
            })
            .collect()
    }

    /// Moves the current row into the batch and starts a new one.
    pub fn add_batch(&mut self) -> Result<()> {
        let row = self.params()?;
        self.batch.push(row);
        self.current = vec![None; self.arity];
        Ok(())
    }

    pub fn batch(&self) -> &[Vec<Value>] {
        &self.batch
    }
}

// == Statement Text ==
fn select_prefix(descriptor: &RecordDescriptor) -> String {
    format!(
        "SELECT {} FROM {}",
        descriptor.column_names().join(","),
        descriptor.table_name()
    )
}

/// `SELECT <columns> FROM <table>`
pub fn select_all_sql(descriptor: &RecordDescriptor) -> String {
    select_prefix(descriptor)
}

/// `SELECT <columns> FROM <table> WHERE <pk> = ?`
pub fn select_by_key_sql(descriptor: &RecordDescriptor) -> String {
    format!(
        "{} WHERE {} = ?",
        select_prefix(descriptor),
        descriptor.primary_key_column()
    )
}

/// `SELECT <columns> FROM <table> WHERE <pk> IN (?,...)` with `count` placeholders.
pub fn select_in_sql(descriptor: &RecordDescriptor, count: usize) -> String {
    format!(
        "{} WHERE {} IN ({})",
        select_prefix(descriptor),
        descriptor.primary_key_column(),
        vec!["?"; count].join(",")
    )
}

/// `INSERT INTO <table> SET <all>=? ON DUPLICATE KEY UPDATE <non-key>=?`
///
/// A table made only of its key updates the key to itself so the statement
/// stays valid and a duplicate is a no-op.
pub fn upsert_sql(descriptor: &RecordDescriptor) -> String {
    let assignments: Vec<String> = descriptor
        .column_names()
        .iter()
        .map(|c| format!("{}=?", c))
        .collect();
    let updates: Vec<String> = descriptor.column_names()[1..]
        .iter()
        .map(|c| format!("{}=?", c))
        .collect();
    let updates = if updates.is_empty() {
        let pk = descriptor.primary_key_column();
        format!("{}={}", pk, pk)
    } else {
        updates.join(", ")
    };
    format!(
        "INSERT INTO {} SET {} ON DUPLICATE KEY UPDATE {}",
        descriptor.table_name(),
        assignments.join(", "),
        updates
    )
}

/// Binds one upsert parameter row for `record` and adds it to the batch.
///
/// Positions `1..=n` carry every column in descriptor order, positions
/// `n+1..=2n-1` the non-key columns again for the update clause.
pub fn bind_upsert(statement: &mut PreparedStatement, record: &Record) -> Result<()> {
    let descriptor = record.descriptor();
    let count = descriptor.column_count();

    for (i, (ty, value)) in descriptor
        .column_types()
        .iter()
        .zip(record.values())
        .enumerate()
    {
        ty.bind(statement, i + 1, value)?;
        if i > 0 {
            ty.bind(statement, count + i, value)?;
        }
    }
    statement.add_batch()
}
