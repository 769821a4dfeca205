use async_trait::async_trait;

use crate::application::errors::StorageError;

/// Store trait - abstraction for the persistence collaborator
#[async_trait]
pub trait Store: Send + Sync {
    /// Run a statement that returns no rows
    async fn execute(&self, sql: &str, params: &[&str]) -> Result<usize, StorageError>;

    /// Run a query and collect each row's columns as strings
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Vec<String>>, StorageError>;

    // Key-value operations
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
