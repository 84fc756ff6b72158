//! Record Module
//!
//! Descriptor-driven records backed by a relational table, cached whole
//! under `RecordStore:<table>:<primary key>`.

mod descriptor;
mod model;
mod service;
pub mod sql;
mod store;
mod types;

pub use descriptor::{DescriptorBuilder, RecordDescriptor, RECORD_CACHE_PREFIX};
pub use model::Record;
pub use service::RecordStoreService;
pub use sql::PreparedStatement;
pub use store::{RecordStore, Row, TransactionHandle};
pub use types::{ColumnType, Value};
