//! Player persistence behind a pluggable interface

pub mod memory;
pub mod traits;

pub use memory::MemoryPlayerStore;
pub use traits::{PlayerStore, SharedPlayerStore};
