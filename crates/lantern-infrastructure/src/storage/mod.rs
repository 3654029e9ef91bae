//! Storage backends.

mod atomic_file;
mod file;
mod memory;

pub use atomic_file::AtomicFile;
pub use file::FileStorage;
pub use memory::MemoryStorage;
