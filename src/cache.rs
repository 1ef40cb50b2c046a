//! Tag-driven cache bookkeeping: tags, the endpoint catalog, and the in-memory query cache.

pub mod endpoint;
pub mod memory;
pub mod tag;

pub use endpoint::*;
pub use memory::*;
pub use tag::*;
