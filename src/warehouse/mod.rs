mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use schema::WAREHOUSE_VERSIONED_SCHEMAS;
pub use store::SqliteWarehouseStore;
#[cfg(any(test, feature = "mock"))]
pub use trait_def::MockStorage;
pub use trait_def::{Storage, StorageError};
