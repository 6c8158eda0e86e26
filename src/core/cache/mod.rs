//! 定容缓存 - 记忆化 OCR/翻译结果，内存有上界

pub mod bounded;
pub mod error;
pub mod shared;

pub use bounded::{BoundedCache, CacheConfig, DEFAULT_BACKUP_THRESHOLD_RATIO};
pub use error::CacheError;
pub use shared::SharedBoundedCache;
