//! Static per-table metadata driving the generic load and save paths.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ResourceError, Result};
use crate::record::{ColumnType, Record, Value};

/// Namespace of record entries in the shared cache.
pub const RECORD_CACHE_PREFIX: &str = "RecordStore:";

// == Record Descriptor ==
/// Table name and ordered columns of one record type. Column 0 is the
/// primary key.
///
/// Descriptors are validated once at construction and shared behind an
/// `Arc`; records hold a reference but never modify it.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordDescriptor {
    table_name: String,
    column_names: Vec<String>,
    column_types: Vec<ColumnType>,
    primary_key_auto_increment: bool,
    cache_prefix: String,
}

impl RecordDescriptor {
    pub fn builder(table_name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            table_name: table_name.into(),
            primary_key: None,
            columns: Vec::new(),
            auto_increment: false,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    pub fn primary_key_column(&self) -> &str {
        &self.column_names[0]
    }

    pub fn primary_key_type(&self) -> ColumnType {
        self.column_types[0]
    }

    pub fn is_auto_increment(&self) -> bool {
        self.primary_key_auto_increment
    }

    /// `RecordStore:<table>:`
    pub fn cache_prefix(&self) -> &str {
        &self.cache_prefix
    }

    /// Cache key of the record whose primary key is `key`.
    pub fn cache_key(&self, key: &Value) -> Result<String> {
        let encoded = self.primary_key_type().encode_cache_key(key)?;
        Ok(format!("{}{}", self.cache_prefix, encoded))
    }

    /// Blank record of this type, every column NULL.
    pub fn new_record(self: &Arc<Self>) -> Record {
        Record::blank(Arc::clone(self))
    }
}

// == Descriptor Builder ==
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    table_name: String,
    primary_key: Option<(String, ColumnType)>,
    columns: Vec<(String, ColumnType)>,
    auto_increment: bool,
}

impl DescriptorBuilder {
    pub fn primary_key(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.primary_key = Some((name.into(), column_type));
        self
    }

    pub fn auto_increment(mut self, enabled: bool) -> Self {
        self.auto_increment = enabled;
        self
    }

    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push((name.into(), column_type));
        self
    }

    /// Validates and freezes the descriptor.
    ///
    /// Fails on a missing primary key, duplicate or empty names, and names
    /// that are not plain SQL identifiers.
    pub fn build(self) -> Result<Arc<RecordDescriptor>> {
        check_identifier(&self.table_name, "table")?;
        let (pk_name, pk_type) = self.primary_key.ok_or_else(|| {
            ResourceError::InvalidDescriptor(format!("{} has no primary key", self.table_name))
        })?;

        let mut column_names = Vec::with_capacity(self.columns.len() + 1);
        let mut column_types = Vec::with_capacity(self.columns.len() + 1);
        let mut seen = HashSet::new();
        for (name, ty) in std::iter::once((pk_name, pk_type)).chain(self.columns) {
            check_identifier(&name, "column")?;
            if !seen.insert(name.clone()) {
                return Err(ResourceError::InvalidDescriptor(format!(
                    "duplicate column {} in {}",
                    name, self.table_name
                )));
            }
            column_names.push(name);
            column_types.push(ty);
        }

        Ok(Arc::new(RecordDescriptor {
            cache_prefix: format!("{}{}:", RECORD_CACHE_PREFIX, self.table_name),
            table_name: self.table_name,
            column_names,
            column_types,
            primary_key_auto_increment: self.auto_increment,
        }))
    }
}

fn check_identifier(name: &str, what: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ResourceError::InvalidDescriptor(format!(
            "invalid {} name {:?}",
            what, name
        )))
    }
}
