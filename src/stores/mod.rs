pub mod file_store;
pub mod memory_store;

pub use file_store::{DirectoryStore, DocumentStore};
pub use memory_store::MemoryStore;
