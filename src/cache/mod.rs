//! Cache item pools.
//!
//! A pool hands out [`CacheItem`]s by key and persists them again on save.
//! Three implementations ship with the crate:
//! - [`SqlitePool`] persists items in a SQLite database with expiry
//! - [`MemoryPool`] keeps items in process memory
//! - [`VoidPool`] stores nothing (caching disabled)

mod memory;
mod storage;
mod traits;

pub use memory::MemoryPool;
pub use storage::{SqlitePool, VoidPool};
pub use traits::{validate_key, CacheItem, CacheItemPool, RESERVED_KEY_CHARS};
