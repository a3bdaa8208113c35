pub mod cancel;
pub mod memory;
pub mod store;

pub use cancel::CancelToken;
pub use memory::MemoryStore;
pub use store::ResourceStore;
