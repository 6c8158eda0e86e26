use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Invalid cache configuration: {0}")]
    InvalidConfiguration(String),
    #[error("An item with the same key has already been added")]
    DuplicateKey,
    #[error("The given key was not present in the cache")]
    KeyNotFound,
}
