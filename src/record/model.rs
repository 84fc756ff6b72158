//! Typed rows and their cache payload encoding.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ResourceError, Result};
use crate::record::{RecordDescriptor, Row, Value};

// == Record ==
/// One row of a descriptor's table, values in descriptor column order.
#[derive(Debug, Clone)]
pub struct Record {
    descriptor: Arc<RecordDescriptor>,
    values: Vec<Value>,
}

/// Cache payload layout. Carries the table name and column order so a
/// payload can never be decoded into a record with another layout, even one
/// mapped onto the same table.
#[derive(Serialize)]
struct PayloadRef<'a> {
    table: &'a str,
    columns: &'a [String],
    values: &'a [Value],
}

#[derive(Deserialize)]
struct Payload {
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Record {
    pub(crate) fn blank(descriptor: Arc<RecordDescriptor>) -> Self {
        let values = vec![Value::Null; descriptor.column_count()];
        Self { descriptor, values }
    }

    pub fn descriptor(&self) -> &Arc<RecordDescriptor> {
        &self.descriptor
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_by_name(&self, column: &str) -> Option<&Value> {
        self.descriptor.column_index(column).and_then(|i| self.get(i))
    }

    pub fn primary_key(&self) -> &Value {
        &self.values[0]
    }

    /// Sets column `index`, checking the value against the column type.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let ty = *self.descriptor.column_types().get(index).ok_or_else(|| {
            ResourceError::TypeMismatch(format!(
                "{} has no column {}",
                self.descriptor.table_name(),
                index
            ))
        })?;
        if !ty.accepts(&value) {
            return Err(ResourceError::TypeMismatch(format!(
                "{}.{} is {}, got {}",
                self.descriptor.table_name(),
                self.descriptor.column_names()[index],
                ty,
                value.type_name()
            )));
        }
        self.values[index] = value;
        Ok(())
    }

    pub fn set_by_name(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.descriptor.column_index(column).ok_or_else(|| {
            ResourceError::TypeMismatch(format!(
                "{} has no column {}",
                self.descriptor.table_name(),
                column
            ))
        })?;
        self.set(index, value)
    }

    /// Chaining form of [`set_by_name`](Self::set_by_name).
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Result<Self> {
        self.set_by_name(column, value)?;
        Ok(self)
    }

    pub fn cache_key(&self) -> Result<String> {
        self.descriptor.cache_key(self.primary_key())
    }

    // == Populate From Row ==
    /// Fills every column from a result row laid out in descriptor order.
    pub fn populate_from_row(&mut self, row: &Row) -> Result<()> {
        self.replace_values(row.values().to_vec())
    }

    // == Cache Payload ==
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = PayloadRef {
            table: self.descriptor.table_name(),
            columns: self.descriptor.column_names(),
            values: &self.values,
        };
        Ok(bincode::serialize(&payload)?)
    }

    /// Fills every column from a payload written by [`to_bytes`](Self::to_bytes).
    pub fn populate_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let payload: Payload = bincode::deserialize(bytes)?;
        if payload.table != self.descriptor.table_name() {
            return Err(ResourceError::Codec(format!(
                "payload for {} decoded as {}",
                payload.table,
                self.descriptor.table_name()
            )));
        }
        if payload.columns != self.descriptor.column_names() {
            return Err(ResourceError::Codec(format!(
                "payload columns ({}) do not match {} ({})",
                payload.columns.join(","),
                self.descriptor.table_name(),
                self.descriptor.column_names().join(",")
            )));
        }
        self.replace_values(payload.values)
    }

    fn replace_values(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.descriptor.column_count() {
            return Err(ResourceError::TypeMismatch(format!(
                "{} expects {} columns, got {}",
                self.descriptor.table_name(),
                self.descriptor.column_count(),
                values.len()
            )));
        }
        for (i, (ty, value)) in self.descriptor.column_types().iter().zip(&values).enumerate() {
            if !ty.accepts(value) {
                return Err(ResourceError::TypeMismatch(format!(
                    "{}.{} is {}, got {}",
                    self.descriptor.table_name(),
                    self.descriptor.column_names()[i],
                    ty,
                    value.type_name()
                )));
            }
        }
        self.values = values;
        Ok(())
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        *self.descriptor == *other.descriptor && self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ColumnType;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn everything() -> Arc<RecordDescriptor> {
        RecordDescriptor::builder("everything")
            .primary_key("id", ColumnType::Long)
            .column("flag", ColumnType::Boolean)
            .column("tiny", ColumnType::Byte)
            .column("small", ColumnType::Short)
            .column("count", ColumnType::Int)
            .column("ratio", ColumnType::Float)
            .column("amount", ColumnType::Double)
            .column("price", ColumnType::Decimal)
            .column("label", ColumnType::Text)
            .column("data", ColumnType::Blob)
            .column("seen_at", ColumnType::Timestamp)
            .build()
            .unwrap()
    }

    #[test]
    fn test_blank_record_is_all_null() {
        let record = everything().new_record();
        assert_eq!(record.values().len(), 11);
        assert!(record.values().iter().all(Value::is_null));
    }

    #[test]
    fn test_set_checks_types() {
        let mut record = everything().new_record();

        record.set_by_name("label", "hello").unwrap();
        assert_eq!(record.get_by_name("label"), Some(&Value::from("hello")));

        assert!(matches!(
            record.set_by_name("label", 5i32),
            Err(ResourceError::TypeMismatch(_))
        ));
        assert!(matches!(
            record.set_by_name("missing", 5i32),
            Err(ResourceError::TypeMismatch(_))
        ));
        assert!(matches!(record.set(99, 5i32), Err(ResourceError::TypeMismatch(_))));
    }

    #[test]
    fn test_populate_from_row() {
        let d = RecordDescriptor::builder("users")
            .primary_key("id", ColumnType::Long)
            .column("name", ColumnType::Text)
            .build()
            .unwrap();
        let mut record = d.new_record();

        record
            .populate_from_row(&Row::new(vec![Value::Long(1), Value::from("ann")]))
            .unwrap();
        assert_eq!(record.primary_key(), &Value::Long(1));
        assert_eq!(record.cache_key().unwrap(), "RecordStore:users:1");

        assert!(record.populate_from_row(&Row::new(vec![Value::Long(1)])).is_err());
        assert!(record
            .populate_from_row(&Row::new(vec![Value::Int(1), Value::from("x")]))
            .is_err());
    }

    #[test]
    fn test_payload_rejects_other_table() {
        let users = RecordDescriptor::builder("users")
            .primary_key("id", ColumnType::Long)
            .build()
            .unwrap();
        let groups = RecordDescriptor::builder("groups")
            .primary_key("id", ColumnType::Long)
            .build()
            .unwrap();
        let user = users.new_record().with("id", 1i64).unwrap();

        let mut group = groups.new_record();
        let result = group.populate_from_bytes(&user.to_bytes().unwrap());
        assert!(matches!(result, Err(ResourceError::Codec(_))));
    }

    #[test]
    fn test_payload_rejects_other_layout_of_same_table() {
        let xy = RecordDescriptor::builder("scores")
            .primary_key("id", ColumnType::Long)
            .column("x", ColumnType::Int)
            .column("y", ColumnType::Int)
            .build()
            .unwrap();
        let yx = RecordDescriptor::builder("scores")
            .primary_key("id", ColumnType::Long)
            .column("y", ColumnType::Int)
            .column("x", ColumnType::Int)
            .build()
            .unwrap();
        let record = xy
            .new_record()
            .with("id", 1i64)
            .unwrap()
            .with("x", 10i32)
            .unwrap()
            .with("y", 20i32)
            .unwrap();

        let mut other = yx.new_record();
        let result = other.populate_from_bytes(&record.to_bytes().unwrap());
        assert!(matches!(result, Err(ResourceError::Codec(_))));
        assert!(other.values().iter().all(Value::is_null));
        assert_ne!(other, record);
    }

    #[test]
    fn test_payload_rejects_garbage() {
        let mut record = everything().new_record();
        assert!(matches!(
            record.populate_from_bytes(&[1, 2, 3]),
            Err(ResourceError::Codec(_))
        ));
    }

    fn finite_f32() -> impl Strategy<Value = f32> {
        prop::num::f32::NORMAL | prop::num::f32::SUBNORMAL | prop::num::f32::ZERO | prop::num::f32::INFINITE
    }

    fn finite_f64() -> impl Strategy<Value = f64> {
        prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO | prop::num::f64::INFINITE
    }

    fn nullable<S: Strategy>(s: S) -> impl Strategy<Value = Option<S::Value>> {
        prop::option::of(s)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Encoding a record for the cache and decoding it yields the same values
        /// for every column type, NULLs included.
        #[test]
        fn prop_cache_payload_round_trip(
            id in any::<i64>(),
            flag in nullable(any::<bool>()),
            tiny in nullable(any::<i8>()),
            small in nullable(any::<i16>()),
            count in nullable(any::<i32>()),
            ratio in nullable(finite_f32()),
            amount in nullable(finite_f64()),
            price in nullable("-?[0-9]{1,12}\\.[0-9]{2}"),
            label in nullable(".*"),
            data in nullable(prop::collection::vec(any::<u8>(), 0..256)),
            seen_at in nullable(-8_000_000_000_000i64..8_000_000_000_000i64),
        ) {
            let d = everything();
            let mut record = d.new_record();
            record.set_by_name("id", id).unwrap();
            record.set_by_name("flag", flag).unwrap();
            record.set_by_name("tiny", tiny).unwrap();
            record.set_by_name("small", small).unwrap();
            record.set_by_name("count", count).unwrap();
            record.set_by_name("ratio", ratio).unwrap();
            record.set_by_name("amount", amount).unwrap();
            record.set_by_name("price", price.map(Value::Decimal).unwrap_or(Value::Null)).unwrap();
            record.set_by_name("label", label).unwrap();
            record.set_by_name("data", data).unwrap();
            record
                .set_by_name(
                    "seen_at",
                    seen_at.and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
                )
                .unwrap();

            let bytes = record.to_bytes().unwrap();
            let mut decoded = d.new_record();
            decoded.populate_from_bytes(&bytes).unwrap();

            prop_assert_eq!(decoded, record);
        }
    }
}
