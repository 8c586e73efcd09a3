//! Vector index backends for tagged legal chunks.
//!
//! [`LanceVectorIndex`] persists chunks in a LanceDB table and pushes the
//! metadata filter into the vector query; [`MemoryVectorIndex`] is a
//! brute-force stand-in with identical filtering semantics.

pub mod memory;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use memory::MemoryVectorIndex;
pub use search::LanceVectorIndex;
