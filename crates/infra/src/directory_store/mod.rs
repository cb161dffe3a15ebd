//! `DirectoryStore` adapters.

pub mod cached;
pub mod in_memory;

pub use cached::CachedDirectoryStore;
pub use in_memory::InMemoryDirectoryStore;
