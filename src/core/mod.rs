//! Core domain models.
//!
//! Pure data structures with no I/O dependencies.

pub mod chunk;

pub use chunk::Chunk;
