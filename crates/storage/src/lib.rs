pub mod documents;
pub mod repository;
pub mod seed;
pub mod sqlite;

pub use repository::{Storage, StorageError};
